use thiserror::Error;

use crate::backend::BackendError;
use crate::scanner::ScannerError;

/// Application-level error type. Resolution failures (`NotFound`,
/// `Connectivity`) reach the primary view with a retry affordance; everything
/// classified as an enhancement failure is swallowed at its origin and never
/// becomes one of these.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No product found for barcode {0}")]
    NotFound(String),

    #[error("Could not reach any product source: {0}")]
    Connectivity(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Scanner error: {0}")]
    Scanner(#[from] ScannerError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether retrying the same input can plausibly succeed. `NotFound`
    /// is not retryable without a different barcode.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Connectivity(_) => true,
            AppError::Scanner(ScannerError::DeviceBusy) => true,
            AppError::Backend(e) => e.is_transport(),
            _ => false,
        }
    }
}
