use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error categories surfaced to the search controller's `error` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    #[error("invalid search parameters")]
    Validation,
    #[error("search service unavailable")]
    ServiceUnavailable,
    #[error("search request timed out")]
    Timeout,
    #[error("unexpected search failure")]
    Unknown,
}

/// Failure of a call into a [`crate::service::SearchService`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("search service unavailable: {0}")]
    Unavailable(String),
    #[error("search service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("search request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("failed to decode search response: {0}")]
    Decode(String),
    #[error("{0}")]
    Other(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Unavailable(_) => ErrorKind::ServiceUnavailable,
            ServiceError::Rejected { .. } => ErrorKind::Validation,
            ServiceError::Timeout(_) => ErrorKind::Timeout,
            ServiceError::Decode(_) | ServiceError::Other(_) => ErrorKind::Unknown,
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate article slug: {0}")]
    DuplicateSlug(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_service_error_kinds() {
        assert_eq!(ServiceError::Timeout(Duration::from_secs(1)).kind(), ErrorKind::Timeout);
        assert_eq!(
            ServiceError::Unavailable("connection refused".into()).kind(),
            ErrorKind::ServiceUnavailable
        );
        assert_eq!(
            ServiceError::Rejected { status: 400, message: "bad".into() }.kind(),
            ErrorKind::Validation
        );
        assert_eq!(ServiceError::Decode("eof".into()).kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::ServiceUnavailable).unwrap();
        assert_eq!(json, "\"service_unavailable\"");
    }
}
