use thiserror::Error;

use crate::domain::Rupees;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Name is required")]
    InvalidName,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Contribution {0} is not offered (choose 100, 1000 or 5000)")]
    InvalidContribution(Rupees),

    #[error("Loan user not found: {0}")]
    LoanUserNotFound(String),

    #[error("Diwali scheme member not found: {0}")]
    DiwaliUserNotFound(String),

    #[error("Invalid vault adjustment: {0}")]
    InvalidVaultAdjustment(String),

    #[error("Identity verification failed: {0}")]
    VerificationFailed(String),

    #[error("Identity could not be confirmed (confidence {confidence:.2}, required {required:.2})")]
    IdentityMismatch {
        confidence: f64,
        required: f64,
        reason: Option<String>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
