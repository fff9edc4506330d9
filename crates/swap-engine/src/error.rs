//! Error types for the swap pipeline.

use crate::classifier::{classify_error, ClassifiedError};
use dex_core::types::OrderHandle;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwapError {
    #[error(transparent)]
    Core(#[from] dex_core::Error),

    #[error("Transaction failed: {}", .0.message)]
    TransactionFailed(ClassifiedError),

    #[error("Tracking {order} timed out after {elapsed:?}")]
    TrackingTimeout { order: OrderHandle, elapsed: Duration },

    #[error("Tracking cancelled")]
    Cancelled,
}

impl SwapError {
    /// User-facing classification with a suggested action.
    pub fn classify(&self) -> ClassifiedError {
        match self {
            Self::Core(e) => classify_error(e),
            Self::TransactionFailed(classified) => classified.clone(),
            Self::TrackingTimeout { .. } => ClassifiedError {
                kind: "TRACKING_TIMEOUT",
                message: self.to_string(),
                action: "Check the transaction in the explorer before resubmitting",
            },
            Self::Cancelled => ClassifiedError {
                kind: "CANCELLED",
                message: self.to_string(),
                action: "Check the transaction in the explorer before resubmitting",
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, SwapError>;
