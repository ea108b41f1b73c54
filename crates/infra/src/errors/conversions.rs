//! Conversions from external infrastructure errors into domain errors.

use adsync_core::limiter::{RemoteError, TransportKind};
use adsync_domain::AdSyncError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub AdSyncError);

impl From<InfraError> for AdSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<AdSyncError> for InfraError {
    fn from(value: AdSyncError) -> Self {
        Self(value)
    }
}

trait IntoAdSyncError {
    fn into_adsync(self) -> AdSyncError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → AdSyncError */
/* -------------------------------------------------------------------------- */

impl IntoAdSyncError for SqlError {
    fn into_adsync(self) -> AdSyncError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => AdSyncError::Database("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        AdSyncError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        AdSyncError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        AdSyncError::Database("foreign key constraint violation".into())
                    }
                    _ => AdSyncError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => AdSyncError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                AdSyncError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                AdSyncError::Database(format!("invalid column type for {name}: {ty}"))
            }
            RE::InvalidPath(path) => AdSyncError::Database(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => AdSyncError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        Self(value.into_adsync())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → AdSyncError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        Self(AdSyncError::Database(format!("connection pool: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → AdSyncError / RemoteError */
/* -------------------------------------------------------------------------- */

impl IntoAdSyncError for HttpError {
    fn into_adsync(self) -> AdSyncError {
        if self.is_timeout() {
            return AdSyncError::Timeout("HTTP request timed out".into());
        }

        if self.is_connect() {
            return AdSyncError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                404 => AdSyncError::NotFound(message),
                429 => AdSyncError::RateLimited(message),
                400..=499 => AdSyncError::InvalidInput(message),
                _ => AdSyncError::Network(message),
            };
        }

        AdSyncError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_adsync())
    }
}

/// Describe a failed HTTP exchange for the limiter's classifier.
///
/// Calls that never got a response keep their transport category so a
/// timeout is told apart from a refused connection or a broken body.
pub fn remote_error_from_http(err: &HttpError) -> RemoteError {
    let kind = if err.is_timeout() {
        TransportKind::Timeout
    } else if err.is_connect() {
        TransportKind::Connect
    } else if err.is_decode() || err.is_body() {
        TransportKind::Decode
    } else {
        TransportKind::Other
    };

    match err.status() {
        Some(status) => RemoteError::http(status.as_u16(), err.to_string()),
        None => RemoteError::transport(kind, err.to_string()),
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use rusqlite::ffi::{Error as FfiError, ErrorCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn sqlite_busy_maps_to_database_error() {
        let err = SqlError::SqliteFailure(
            FfiError { code: ErrorCode::DatabaseBusy, extended_code: 5 },
            Some("database is locked".into()),
        );

        let mapped: AdSyncError = InfraError::from(err).into();
        match mapped {
            AdSyncError::Database(msg) => assert!(msg.contains("busy")),
            other => panic!("expected database error, got {other:?}"),
        }
    }

    #[test]
    fn missing_row_maps_to_not_found() {
        let mapped: AdSyncError = InfraError::from(SqlError::QueryReturnedNoRows).into();
        assert!(matches!(mapped, AdSyncError::NotFound(_)));
    }

    #[tokio::test]
    async fn http_status_429_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::TOO_MANY_REQUESTS))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let remote = remote_error_from_http(&error);
        assert_eq!(remote.status, Some(429));

        let mapped: AdSyncError = InfraError::from(error).into();
        match mapped {
            AdSyncError::RateLimited(msg) => assert!(msg.contains("429")),
            other => panic!("expected rate limited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refused_connection_is_a_connect_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let remote = remote_error_from_http(&error);
        assert_eq!(remote.transport, Some(TransportKind::Connect));
    }
}
