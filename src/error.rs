//! Error types for the identity resolver and the credential broker.

use aws_sdk_sts::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors raised while talking to STS or S3.
///
/// The message of each variant is the raw message of the underlying failure;
/// it is what callers see in the `detail` field of a 500 response.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Role assumption denied or ambient identity lacks permission
    #[error("{0}")]
    Authorization(String),

    /// Bucket or key does not exist
    #[error("{0}")]
    NotFound(String),

    /// Network, DNS, timeout, or unreadable response
    #[error("{0}")]
    Transport(String),

    /// Object body is not valid UTF-8
    #[error("object body is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// Any other error reported by the service
    #[error("{0}")]
    Service(String),
}

impl BrokerError {
    /// HTTP status returned for each error kind.
    ///
    /// Every kind currently maps to 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BrokerError::Authorization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BrokerError::NotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BrokerError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BrokerError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BrokerError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short name of the error kind, used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            BrokerError::Authorization(_) => "authorization",
            BrokerError::NotFound(_) => "not_found",
            BrokerError::Transport(_) => "transport",
            BrokerError::Decode(_) => "decode",
            BrokerError::Service(_) => "service",
        }
    }

    /// Classify an AWS SDK error by its variant and service error code
    pub fn from_sdk<E, R>(err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: std::fmt::Debug + Send + Sync + 'static,
    {
        let message = DisplayErrorContext(&err).to_string();

        match &err {
            SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
                BrokerError::Transport(message)
            }
            SdkError::ServiceError(service_err) => {
                classify_service_code(service_err.err().code(), message)
            }
            _ => BrokerError::Service(message),
        }
    }
}

/// Map an AWS error code to an error kind
pub fn classify_service_code(code: Option<&str>, message: String) -> BrokerError {
    match code {
        Some(
            "AccessDenied"
            | "AccessDeniedException"
            | "ExpiredToken"
            | "ExpiredTokenException"
            | "InvalidClientTokenId"
            | "InvalidAccessKeyId"
            | "SignatureDoesNotMatch"
            | "RegionDisabledException",
        ) => BrokerError::Authorization(message),
        Some("NoSuchKey" | "NoSuchBucket" | "NotFound") => BrokerError::NotFound(message),
        _ => BrokerError::Service(message),
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for BrokerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error!(kind = self.kind(), status = status.as_u16(), "Request failed: {}", self);

        (
            status,
            Json(ErrorBody {
                detail: self.to_string(),
            }),
        )
            .into_response()
    }
}
