//! Unified error types for doccache.
//!
//! Every failure of a cache operation is one of these variants. Callers
//! dispatch on the variant; the display string starts with a stable code.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Unified error types for the document cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The remote source could not be opened or read.
    #[error("UNREACHABLE_SOURCE: {0}")]
    UnreachableSource(String),

    /// The download exceeded the configured ceiling and was aborted.
    #[error("CONTENT_TOO_LARGE: exceeds {limit} bytes")]
    ContentTooLarge { limit: usize },

    /// The sniffed media type is not in the allow-list.
    #[error("MIME_REJECTED: {0}")]
    MimeRejected(String),

    /// The store refused the folder creation or file write.
    #[error("STORE_WRITE_ERROR: {0}")]
    StoreWriteError(String),

    /// Empty or unresolvable cache path.
    #[error("DOCUMENT_DOES_NOT_EXIST")]
    DocumentDoesNotExist,

    /// The cached content could not be read back.
    #[error("CACHE_CONTENT_UNAVAILABLE: {0}")]
    CacheContentUnavailable(String),

    /// Invalid input parameters (e.g., empty URL).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::DocumentDoesNotExist => (-32001, "document does not exist".to_string()),
            Error::CacheContentUnavailable(msg) => (-32001, msg.clone()),
            Error::StoreWriteError(msg) => (-32002, msg.clone()),
            Error::UnreachableSource(msg) => (-32003, msg.clone()),
            Error::MimeRejected(mime) => (-32004, format!("mime type not allowed: {mime}")),
            Error::ContentTooLarge { limit } => (-32007, format!("content exceeds {limit} bytes")),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MimeRejected("application/pdf".to_string());
        assert!(err.to_string().contains("MIME_REJECTED"));
        assert!(err.to_string().contains("application/pdf"));
    }

    #[test]
    fn test_content_too_large_display() {
        let err = Error::ContentTooLarge { limit: 1024 };
        assert_eq!(err.to_string(), "CONTENT_TOO_LARGE: exceeds 1024 bytes");
    }

    #[test]
    fn test_error_to_mcp_error() {
        let mcp_err: McpError = Error::DocumentDoesNotExist.into();
        assert_eq!(mcp_err.code.0, -32001);

        let mcp_err: McpError = Error::ContentTooLarge { limit: 1 }.into();
        assert_eq!(mcp_err.code.0, -32007);

        let mcp_err: McpError = Error::InvalidInput("url cannot be empty".into()).into();
        assert_eq!(mcp_err.code.0, -32602);
    }
}
