// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chitbook::application::{LedgerConfig, LedgerService, NewDiwaliUser, NewLoanUser};
use chitbook::domain::{DiwaliUser, Frequency, LoanType, LoanUser, Rupees};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    test_service_with(LedgerConfig::default()).await
}

/// Helper to create a test service with a custom configuration
pub async fn test_service_with(config: LedgerConfig) -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap(), config).await?;
    Ok((service, temp_dir))
}

pub fn new_loan(name: &str, principal: Rupees, loan_type: LoanType) -> NewLoanUser {
    NewLoanUser {
        name: name.to_string(),
        contact: None,
        id_proof: None,
        principal,
        loan_type,
    }
}

pub fn new_saver(name: &str, contribution: Rupees, frequency: Frequency) -> NewDiwaliUser {
    NewDiwaliUser {
        name: name.to_string(),
        contact: None,
        id_proof: None,
        contribution,
        frequency,
    }
}

/// Register a borrower and return the stored record
pub async fn register(
    service: &LedgerService,
    name: &str,
    principal: Rupees,
    loan_type: LoanType,
) -> Result<LoanUser> {
    let result = service
        .register_loan_user(new_loan(name, principal, loan_type))
        .await?;
    Ok(result.user)
}

/// Enroll a scheme member and return the stored record
pub async fn enroll(
    service: &LedgerService,
    name: &str,
    contribution: Rupees,
    frequency: Frequency,
) -> Result<DiwaliUser> {
    let result = service
        .enroll_diwali_user(new_saver(name, contribution, frequency))
        .await?;
    Ok(result.user)
}
