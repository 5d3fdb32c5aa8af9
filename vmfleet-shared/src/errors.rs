//! Error taxonomy for fleet provisioning.
//!
//! Every failure that reaches an operator names the server and the remote
//! operation involved, so a failed run can be diagnosed from its output alone.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VmfleetError {
    /// A descriptor or configuration document failed a precondition.
    /// Detected before any remote call is made.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A control-plane call returned non-success or did not answer in time.
    #[error("{operation} failed for {server}: {reason}")]
    ProviderOperationFailed {
        server: String,
        operation: String,
        reason: String,
    },

    /// The configuration-management stage could not be run or failed.
    #[error("configuration handoff failed: {0}")]
    HandoffFailed(String),

    /// The run was interrupted by the operator.
    #[error("cancelled")]
    Cancelled,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error class, stable across releases and used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidConfiguration,
    ProviderOperationFailed,
    HandoffFailed,
    Cancelled,
    Storage,
    Internal,
}

impl VmfleetError {
    pub fn provider(
        server: impl Into<String>,
        operation: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ProviderOperationFailed {
            server: server.into(),
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            Self::ProviderOperationFailed { .. } => ErrorKind::ProviderOperationFailed,
            Self::HandoffFailed(_) => ErrorKind::HandoffFailed,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Storage(_) | Self::Io(_) => ErrorKind::Storage,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

pub type VmfleetResult<T> = Result<T, VmfleetError>;
