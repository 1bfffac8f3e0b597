//! Error types for the finance core

use thiserror::Error;

/// Result type alias for calculator and advisor operations
pub type Result<T> = std::result::Result<T, FinanceError>;

#[derive(Error, Debug)]
pub enum FinanceError {

    // =============================
    // Core Errors
    // =============================

    /// A parameter is outside its valid domain. Always fixable by the caller.
    #[error("Invalid input: {field} {reason}")]
    InvalidInput { field: String, reason: String },

    /// Payoff simulation hit the month cap with balance still outstanding.
    #[error("Payoff did not converge within {months} months ({remaining_balance:.2} still owed)")]
    NonConverging { months: u32, remaining_balance: f64 },

    /// External text generation failed. Recovered inside the advisor.
    #[error("Generation backend unavailable: {0}")]
    BackendUnavailable(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl FinanceError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FinanceError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether the end user can fix this by changing what they entered
    pub fn is_caller_recoverable(&self) -> bool {
        matches!(
            self,
            FinanceError::InvalidInput { .. } | FinanceError::NonConverging { .. }
        )
    }
}
