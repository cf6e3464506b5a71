//! Errors of the fetch and assembly pipeline.

use thiserror::Error;
use xchain_types::{proto::AggregateDecodeError, ValidatorError};

/// Failure of a single approved-from query.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The query never produced a response.
    #[error("abci query approved-from: {0:#}")]
    Transport(anyhow::Error),
    /// The remote answered with a non-ok status.
    #[error("abci query approved-from failed: code={code} log={log:?} info={info:?} codespace={codespace:?}")]
    RemoteQuery {
        /// Remote status code.
        code: u32,
        /// Remote log.
        log: String,
        /// Remote info.
        info: String,
        /// Remote codespace.
        codespace: String,
    },
    /// The remote answered with a payload that does not decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl FetchError {
    /// Whether repeating the same query may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Decode(_))
    }
}

/// Malformed approved-from payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The response envelope does not decode.
    #[error("unmarshal approved-from response: {0}")]
    Response(#[from] prost::DecodeError),
    /// A raw aggregate does not convert into a valid aggregate.
    #[error("unmarshal approved-from aggregates: {0}")]
    Aggregates(#[from] AggregateDecodeError),
}

/// The governing [`CancellationToken`](tokio_util::sync::CancellationToken) fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Errors surfaced by [`Provider::xblock`](crate::Provider::xblock).
///
/// Remote and transport failures never appear here: they are retried until the
/// call succeeds or is cancelled.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The consensus chain id could not be resolved.
    #[error("resolve chain id: {0:#}")]
    IdentityResolution(anyhow::Error),
    /// The validator set lookup failed.
    #[error("resolve validator set: {0:#}")]
    ValidatorSet(anyhow::Error),
    /// The validator set violates integrity constraints.
    #[error("invalid validator set: {0}")]
    InvalidValidatorSet(#[from] ValidatorError),
    /// The remote returned a malformed payload.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The call was cancelled before completing.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;
    use xchain_types::proto::ApprovedFromResponse;

    #[test]
    fn only_decode_errors_are_final() {
        assert!(FetchError::Transport(anyhow::anyhow!("connection refused")).is_retryable());
        assert!(FetchError::RemoteQuery {
            code: 18,
            log: "height not found".to_string(),
            info: String::new(),
            codespace: "halo".to_string(),
        }
        .is_retryable());
        let malformed = ApprovedFromResponse::decode([0xFF_u8].as_slice()).unwrap_err();
        assert!(!FetchError::Decode(DecodeError::Response(malformed)).is_retryable());
    }

    #[test]
    fn remote_error_keeps_diagnostics_verbatim() {
        let err = FetchError::RemoteQuery {
            code: 5,
            log: "out of gas".to_string(),
            info: "gas: 10".to_string(),
            codespace: "sdk".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("code=5"), "{msg}");
        assert!(msg.contains("\"out of gas\""), "{msg}");
        assert!(msg.contains("\"gas: 10\""), "{msg}");
    }
}
