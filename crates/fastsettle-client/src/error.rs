//! Client-facing error type.

use thiserror::Error;

use fastsettle_core::{AbiError, DecodeError, RevertReason};

use crate::backend::BackendError;

/// Everything a proxy operation can fail with.
///
/// Backend errors pass through unchanged. Chain rejections that carry
/// revert data are resolved against the contract schema so the caller sees
/// the declared error name and arguments — resolution only, no
/// classification and no retries.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Abi(#[from] AbiError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("execution reverted: {0}")]
    Reverted(RevertReason),
}

impl ClientError {
    /// The decoded revert reason, when the failure was a chain rejection.
    pub fn revert_reason(&self) -> Option<&RevertReason> {
        match self {
            Self::Reverted(reason) => Some(reason),
            _ => None,
        }
    }
}
