//! API errors

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Error body returned by the platform on non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Failure talking to the control plane
#[derive(Debug, Error)]
pub enum ApiError {
    /// The platform answered with an error status
    #[error("[{status}] {id}: {message}")]
    Status {
        status: StatusCode,
        id: String,
        message: String,
        request_id: Option<String>,
    },

    /// The platform answered successfully but left out a field we need
    #[error("response from {endpoint} is missing {field}")]
    MissingField {
        endpoint: String,
        field: &'static str,
    },

    /// The request never got a response
    #[error("failed to reach {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body could not be decoded
    #[error("unexpected response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    /// Build a status error from a raw response body
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => ApiError::Status {
                status,
                id: parsed.id,
                message: parsed.message,
                request_id: parsed.request_id,
            },
            Err(_) => ApiError::Status {
                status,
                id: status
                    .canonical_reason()
                    .unwrap_or("unknown")
                    .to_lowercase()
                    .replace(' ', "_"),
                message: body.trim().to_string(),
                request_id: None,
            },
        }
    }

    /// HTTP status, when the platform answered
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The first `ApiError` in an error chain
    pub fn find(err: &anyhow::Error) -> Option<&ApiError> {
        err.chain().find_map(|cause| cause.downcast_ref::<ApiError>())
    }

    /// True when the platform refused the token
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// True when the platform rejected a create because the name is taken
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ApiError::Status { status, .. } if *status == StatusCode::CONFLICT
        ) || matches!(
            self,
            ApiError::Status { id, .. } if id == "already_exists"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_platform_error() {
        let body = r#"{"id":"not_found","message":"The resource you requested could not be found.","request_id":"abc"}"#;
        let err = ApiError::from_body(StatusCode::NOT_FOUND, body);
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(
            err.to_string(),
            "[404 Not Found] not_found: The resource you requested could not be found."
        );
    }

    #[test]
    fn test_keeps_raw_body_when_unparseable() {
        let err = ApiError::from_body(StatusCode::BAD_GATEWAY, "upstream down\n");
        match err {
            ApiError::Status { id, message, .. } => {
                assert_eq!(id, "bad_gateway");
                assert_eq!(message, "upstream down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_found_through_context() {
        let err = anyhow::Error::from(ApiError::from_body(
            StatusCode::UNAUTHORIZED,
            r#"{"id":"unauthorized","message":"Unable to authenticate you"}"#,
        ))
        .context("Could not verify token");

        let api = ApiError::find(&err).unwrap();
        assert!(api.is_unauthorized());
        assert!(!api.is_conflict());
        assert!(ApiError::find(&anyhow::anyhow!("plain")).is_none());
    }

    #[test]
    fn test_conflict_detection() {
        let err = ApiError::from_body(
            StatusCode::CONFLICT,
            r#"{"id":"conflict","message":"bucket exists"}"#,
        );
        assert!(err.is_conflict());

        let err = ApiError::from_body(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"id":"already_exists","message":"namespace label in use"}"#,
        );
        assert!(err.is_conflict());
    }
}
