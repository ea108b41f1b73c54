//! Display/FromStr generation for the string-backed status enums.
//!
//! Local rows store statuses in lowercase while the ad platform reports them
//! in uppercase (`ACTIVE`, `PAUSED`), so parsing is case-insensitive and
//! rendering is always lowercase.
//!
//! # Example
//!
//! ```rust
//! use adsync_domain::impl_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Delivery {
//!     Learning,
//!     Stable,
//! }
//!
//! impl_status_conversions!(Delivery {
//!     Learning => "learning",
//!     Stable => "stable",
//! });
//!
//! assert_eq!("LEARNING".parse::<Delivery>().unwrap(), Delivery::Learning);
//! assert_eq!(Delivery::Stable.to_string(), "stable");
//! ```

/// Implements `Display` and `FromStr` for a fieldless enum from a
/// variant-to-string table.
#[macro_export]
macro_rules! impl_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl $enum_name {
            /// Canonical lowercase representation.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::errors::AdSyncError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err($crate::errors::AdSyncError::InvalidInput(format!(
                        "invalid {}: {s}",
                        stringify!($enum_name)
                    ))),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::errors::AdSyncError;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Pacing {
        Standard,
        NoPacing,
    }

    impl_status_conversions!(Pacing {
        Standard => "standard",
        NoPacing => "no_pacing",
    });

    #[test]
    fn renders_lowercase() {
        assert_eq!(Pacing::Standard.to_string(), "standard");
        assert_eq!(Pacing::NoPacing.as_str(), "no_pacing");
    }

    #[test]
    fn parses_any_case_and_trims() {
        assert_eq!(Pacing::from_str("STANDARD").unwrap(), Pacing::Standard);
        assert_eq!(Pacing::from_str(" No_Pacing ").unwrap(), Pacing::NoPacing);
    }

    #[test]
    fn rejects_unknown_values() {
        let err = Pacing::from_str("day_parting").unwrap_err();
        assert!(matches!(err, AdSyncError::InvalidInput(ref msg) if msg.contains("Pacing")));
        assert!(Pacing::from_str("").is_err());
    }
}
