//! Error types for the yield tracker

use serde::Serialize;
use thiserror::Error;
use yield_math::MathError;

/// Main tracker error type
#[derive(Error, Debug)]
pub enum YieldError {
    #[error("Data source unreachable at {url}: {reason}")]
    SourceUnreachable { url: String, reason: String },

    #[error("Node rejected request (code {code}): {message}")]
    NodeRejected { code: i64, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("No supply activity for {account} in {symbol}")]
    NoData { account: String, symbol: String },

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Settings store error: {0}")]
    Settings(String),

    #[error(transparent)]
    Math(#[from] MathError),
}

/// Result type alias for tracker operations
pub type YieldResult<T> = Result<T, YieldError>;

/// Coarse failure classes shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    SourceUnreachable,
    MalformedResponse,
    NoData,
    Other,
}

impl YieldError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        YieldError::MalformedResponse(reason.into())
    }

    /// Classify the error into the user-facing taxonomy
    pub fn kind(&self) -> FailureKind {
        match self {
            YieldError::SourceUnreachable { .. } => FailureKind::SourceUnreachable,
            YieldError::NodeRejected { .. } | YieldError::MalformedResponse(_) => {
                FailureKind::MalformedResponse
            }
            YieldError::NoData { .. } => FailureKind::NoData,
            YieldError::InvalidAddress(_)
            | YieldError::Configuration(_)
            | YieldError::Settings(_)
            | YieldError::Math(_) => FailureKind::Other,
        }
    }
}

impl From<serde_json::Error> for YieldError {
    fn from(err: serde_json::Error) -> Self {
        YieldError::MalformedResponse(err.to_string())
    }
}

impl From<hex::FromHexError> for YieldError {
    fn from(err: hex::FromHexError) -> Self {
        YieldError::MalformedResponse(format!("invalid hex: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classification() {
        let unreachable = YieldError::SourceUnreachable {
            url: "http://localhost:8545".to_string(),
            reason: "connection refused".to_string(),
        };
        assert_eq!(unreachable.kind(), FailureKind::SourceUnreachable);

        let rejected = YieldError::NodeRejected {
            code: -32602,
            message: "invalid params".to_string(),
        };
        assert_eq!(rejected.kind(), FailureKind::MalformedResponse);

        let empty = YieldError::NoData {
            account: "0x00".to_string(),
            symbol: "USDC".to_string(),
        };
        assert_eq!(empty.kind(), FailureKind::NoData);

        let math: YieldError = MathError::overflow("test").into();
        assert_eq!(math.kind(), FailureKind::Other);
    }
}
