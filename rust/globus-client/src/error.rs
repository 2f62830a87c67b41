use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// The common error type used by this crate.
///
/// Non-success responses from the Globus services are classified by HTTP
/// status so that call sites can match on the failure kind. `Unauthorized`
/// is the signal [`with_token_refresh`](crate::with_token_refresh) uses to
/// decide whether to refresh the bearer token and retry.
#[derive(Debug, Error)]
pub enum GlobusClientError {
    /// The bearer token is invalid or expired (HTTP 401)
    #[error("Globus token is invalid or expired: {message}")]
    Unauthorized {
        /// Message reported by the service
        message: String,
    },

    /// The operation is not permitted for this client (HTTP 403)
    #[error("Operation forbidden by the Globus service: {message}")]
    Forbidden {
        /// Message reported by the service
        message: String,
    },

    /// The service rejected the request as malformed (HTTP 400)
    #[error("Globus service rejected the request: {message}")]
    BadRequest {
        /// Message reported by the service
        message: String,
    },

    /// The requested resource does not exist (HTTP 404)
    #[error("Globus resource not found: {message}")]
    NotFound {
        /// Message reported by the service
        message: String,
    },

    /// Any other non-success response from the service
    #[error("Globus endpoint error (HTTP {status}, code {code}): {message}")]
    EndpointError {
        /// HTTP status of the response
        status: u16,
        /// Upstream error code, when the body carried one
        code: String,
        /// Message reported by the service
        message: String,
    },

    /// The user has no active Globus identity
    #[error("No active Globus identity found for {username}")]
    IdentityNotFound {
        /// The username the lookup was performed for
        username: String,
    },

    /// The HTTP request itself failed (connection, timeout, body decode)
    #[error("HTTP request to the Globus service failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Error body shape shared by the Globus transfer and auth services
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Extract the upstream error code from a response body, if the body is a
/// Globus error document.
pub(crate) fn error_code(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body).ok()?.code
}

impl GlobusClientError {
    /// Classify a non-success response by status code, carrying the parsed
    /// upstream code and message when the body has them.
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed = serde_json::from_str::<ErrorBody>(body).ok();
        let code = parsed
            .as_ref()
            .and_then(|error| error.code.clone())
            .unwrap_or_default();
        let message = parsed
            .and_then(|error| error.message)
            .unwrap_or_else(|| body.to_string());

        match status {
            StatusCode::BAD_REQUEST => Self::BadRequest { message },
            StatusCode::UNAUTHORIZED => Self::Unauthorized { message },
            StatusCode::FORBIDDEN => Self::Forbidden { message },
            StatusCode::NOT_FOUND => Self::NotFound { message },
            status => Self::EndpointError {
                status: status.as_u16(),
                code,
                message,
            },
        }
    }

    /// Consume a non-success response and classify it.
    pub(crate) async fn classify(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::from_response(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_status_code() {
        let body = r#"{"code": "SomeCode", "message": "nope"}"#;

        assert!(matches!(
            GlobusClientError::from_response(StatusCode::BAD_REQUEST, body),
            GlobusClientError::BadRequest { .. }
        ));
        assert!(matches!(
            GlobusClientError::from_response(StatusCode::UNAUTHORIZED, body),
            GlobusClientError::Unauthorized { .. }
        ));
        assert!(matches!(
            GlobusClientError::from_response(StatusCode::FORBIDDEN, body),
            GlobusClientError::Forbidden { .. }
        ));
        assert!(matches!(
            GlobusClientError::from_response(StatusCode::NOT_FOUND, body),
            GlobusClientError::NotFound { .. }
        ));
    }

    #[test]
    fn carries_upstream_code_and_message_for_other_statuses() {
        let body = r#"{"code": "ExternalError.SomeOtherError", "message": "External Error"}"#;
        let error = GlobusClientError::from_response(StatusCode::BAD_GATEWAY, body);

        match error {
            GlobusClientError::EndpointError {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 502);
                assert_eq!(code, "ExternalError.SomeOtherError");
                assert_eq!(message, "External Error");
            }
            other => panic!("expected EndpointError, got {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_the_raw_body_when_not_a_globus_error_document() {
        let error = GlobusClientError::from_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
        );

        match error {
            GlobusClientError::EndpointError { code, message, .. } => {
                assert_eq!(code, "");
                assert_eq!(message, "Internal Server Error");
            }
            other => panic!("expected EndpointError, got {other:?}"),
        }
    }

    #[test]
    fn extracts_error_codes_from_error_documents() {
        assert_eq!(
            error_code(r#"{"code": "ExternalError.MkdirFailed.Exists", "message": "exists"}"#),
            Some("ExternalError.MkdirFailed.Exists".to_string())
        );
        assert_eq!(error_code("not json"), None);
        assert_eq!(error_code(r#"{"message": "no code"}"#), None);
    }
}
