//! Infrastructure error conversions.

mod conversions;

pub use conversions::{remote_error_from_http, InfraError};
