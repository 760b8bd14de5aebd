use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::{
    build_history, clamp_principal, compute_vault_summary, format_rupees, is_allowed_contribution,
    project_savings, quote_loan, Deposit, DiwaliUser, DiwaliUserId, Frequency, HistoryEntry,
    LoanQuote, LoanStatus, LoanTransaction, LoanType, LoanUser, LoanUserId, Rupees,
    SavingsProjection, VaultAdjustment, VaultSummary, VerificationOutcome, VerificationRequest,
    MAX_AMOUNT, MAX_PRINCIPAL, PRINCIPAL_STEP,
};
use crate::storage::{DiwaliUserChanges, LoanUserChanges, Repository};

use super::{AppError, IdentityVerifier, LedgerConfig};

/// Application service providing the bookkeeping use cases.
/// This is the only interface the CLI (or any other client) talks to.
pub struct LedgerService {
    repo: Repository,
    config: LedgerConfig,
}

/// Details collected when a borrower is registered.
#[derive(Debug, Clone)]
pub struct NewLoanUser {
    pub name: String,
    pub contact: Option<String>,
    pub id_proof: Option<String>,
    pub principal: Rupees,
    pub loan_type: LoanType,
}

/// Details collected when a member joins the savings scheme.
#[derive(Debug, Clone)]
pub struct NewDiwaliUser {
    pub name: String,
    pub contact: Option<String>,
    pub id_proof: Option<String>,
    pub contribution: Rupees,
    pub frequency: Frequency,
}

/// Admin overrides for a borrower. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct LoanUserEdit {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub id_proof: Option<String>,
    pub loan_amount: Option<Rupees>,
    pub paid_amount: Option<Rupees>,
}

/// Admin overrides for a scheme member. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct DiwaliUserEdit {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub id_proof: Option<String>,
    pub contribution: Option<Rupees>,
    pub frequency: Option<Frequency>,
    pub total_saved: Option<Rupees>,
}

/// Result of registering a borrower
pub struct RegistrationResult {
    pub user: LoanUser,
    pub quote: LoanQuote,
}

/// Result of posting a repayment
pub struct RepaymentResult {
    pub transaction: LoanTransaction,
    pub loan_amount: Rupees,
    pub paid_amount: Rupees,
    pub status: LoanStatus,
}

impl RepaymentResult {
    pub fn balance(&self) -> Rupees {
        self.loan_amount - self.paid_amount
    }
}

/// Result of enrolling a scheme member
pub struct EnrollmentResult {
    pub user: DiwaliUser,
    pub projection: SavingsProjection,
}

/// Result of posting a deposit
pub struct DepositResult {
    pub deposit: Deposit,
    pub total_saved: Rupees,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository, config: LedgerConfig) -> Self {
        Self { repo, config }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str, config: LedgerConfig) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        info!(database = database_path, "database initialized");
        Ok(Self::new(repo, config))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str, config: LedgerConfig) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo, config))
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ========================
    // Identity
    // ========================

    /// Run the face match and reject the onboarding unless it passes the
    /// configured confidence threshold.
    pub async fn confirm_identity<V: IdentityVerifier>(
        &self,
        verifier: &V,
        request: &VerificationRequest,
    ) -> Result<VerificationOutcome, AppError> {
        let required = self
            .config
            .verifier
            .as_ref()
            .map(|v| v.min_confidence)
            .unwrap_or(0.0);

        let outcome = verifier.verify(request).await?;
        if !outcome.passes(required) {
            warn!(
                is_match = outcome.is_match,
                confidence = outcome.confidence,
                required,
                "identity verification rejected"
            );
            return Err(AppError::IdentityMismatch {
                confidence: outcome.confidence,
                required,
                reason: outcome.reason,
            });
        }

        info!(confidence = outcome.confidence, "identity verified");
        Ok(outcome)
    }

    // ========================
    // Loans
    // ========================

    /// Quote a loan without booking anything.
    pub fn quote_loan(&self, principal: Rupees, loan_type: LoanType) -> LoanQuote {
        quote_loan(principal, loan_type)
    }

    /// Register a borrower and book the disbursement.
    pub async fn register_loan_user(&self, new: NewLoanUser) -> Result<RegistrationResult, AppError> {
        let name = validate_name(&new.name)?;
        if new.principal <= 0
            || new.principal > MAX_PRINCIPAL
            || clamp_principal(new.principal) != new.principal
        {
            return Err(AppError::InvalidAmount(format!(
                "Loan amount must be a multiple of {} between {} and {}",
                PRINCIPAL_STEP, PRINCIPAL_STEP, MAX_PRINCIPAL
            )));
        }

        let quote = quote_loan(new.principal, new.loan_type);
        let mut user = LoanUser::new(name, &quote, Utc::now());
        user.contact = normalize(new.contact);
        user.id_proof = normalize(new.id_proof);

        self.repo.save_loan_user(&user).await?;
        info!(
            user_id = %user.id,
            principal = quote.principal,
            disbursed = quote.disbursed_amount,
            loan_type = %quote.loan_type,
            "loan user registered"
        );

        Ok(RegistrationResult { user, quote })
    }

    /// Get a borrower with its transaction log.
    pub async fn get_loan_user(&self, id: LoanUserId) -> Result<LoanUser, AppError> {
        debug!(user_id = %id, "loading loan user");
        self.repo
            .get_loan_user(id)
            .await?
            .ok_or_else(|| AppError::LoanUserNotFound(id.to_string()))
    }

    /// List all borrowers.
    pub async fn list_loan_users(&self) -> Result<Vec<LoanUser>, AppError> {
        Ok(self.repo.list_loan_users().await?)
    }

    /// Record a repayment. Overpayment is accepted.
    pub async fn post_repayment(
        &self,
        id: LoanUserId,
        amount: Rupees,
    ) -> Result<RepaymentResult, AppError> {
        validate_posting("Repayment", amount)?;

        let transaction = LoanTransaction::repayment(amount, Utc::now());
        let totals = self
            .repo
            .post_repayment(id, &transaction)
            .await?
            .ok_or_else(|| AppError::LoanUserNotFound(id.to_string()))?;

        // Only the face value is needed for the balance; it is not touched
        // by repayments so reading it after the commit is safe.
        let user = self.get_loan_user(id).await?;
        if totals.paid_amount > user.loan_amount {
            warn!(
                user_id = %id,
                paid = totals.paid_amount,
                loan = user.loan_amount,
                "repayment exceeds loan amount"
            );
        }
        info!(user_id = %id, amount, status = %totals.status, "repayment posted");

        Ok(RepaymentResult {
            transaction,
            loan_amount: user.loan_amount,
            paid_amount: totals.paid_amount,
            status: totals.status,
        })
    }

    /// Apply admin overrides to a borrower. Only the fields that are set
    /// are written; the status is re-derived and no transaction is appended.
    pub async fn edit_loan_user(
        &self,
        id: LoanUserId,
        edit: LoanUserEdit,
    ) -> Result<LoanUser, AppError> {
        let changes = LoanUserChanges {
            name: edit.name.as_deref().map(validate_name).transpose()?,
            contact: edit.contact.map(|c| normalize(Some(c))),
            id_proof: edit.id_proof.map(|p| normalize(Some(p))),
            loan_amount: edit
                .loan_amount
                .map(|a| validate_stored("Loan amount", a))
                .transpose()?,
            paid_amount: edit
                .paid_amount
                .map(|a| validate_stored("Paid amount", a))
                .transpose()?,
        };

        if !self.repo.update_loan_user(id, &changes).await? {
            return Err(AppError::LoanUserNotFound(id.to_string()));
        }
        let user = self.get_loan_user(id).await?;
        info!(user_id = %id, status = %user.status, "loan user edited");
        Ok(user)
    }

    /// Delete a borrower and its log. Returns the record as it was.
    pub async fn delete_loan_user(&self, id: LoanUserId) -> Result<LoanUser, AppError> {
        let user = self.get_loan_user(id).await?;
        if !self.repo.delete_loan_user(id).await? {
            return Err(AppError::LoanUserNotFound(id.to_string()));
        }
        info!(user_id = %id, "loan user deleted");
        Ok(user)
    }

    // ========================
    // Diwali scheme
    // ========================

    /// Project the festival payout for a pledge.
    pub fn project_savings(
        &self,
        contribution: Rupees,
        frequency: Frequency,
    ) -> Result<SavingsProjection, AppError> {
        if !is_allowed_contribution(contribution) {
            return Err(AppError::InvalidContribution(contribution));
        }
        Ok(project_savings(contribution, frequency))
    }

    /// Enroll a member; the first pledge is collected immediately and the
    /// bonus estimate is fixed from the projection.
    pub async fn enroll_diwali_user(&self, new: NewDiwaliUser) -> Result<EnrollmentResult, AppError> {
        let name = validate_name(&new.name)?;
        let projection = self.project_savings(new.contribution, new.frequency)?;

        let mut user = DiwaliUser::new(name, new.contribution, new.frequency, Utc::now());
        user.contact = normalize(new.contact);
        user.id_proof = normalize(new.id_proof);

        self.repo.save_diwali_user(&user).await?;
        info!(
            user_id = %user.id,
            contribution = user.contribution,
            frequency = %user.frequency,
            estimated_bonus = user.estimated_bonus,
            "diwali member enrolled"
        );

        Ok(EnrollmentResult { user, projection })
    }

    /// Get a scheme member with its deposit log.
    pub async fn get_diwali_user(&self, id: DiwaliUserId) -> Result<DiwaliUser, AppError> {
        debug!(user_id = %id, "loading diwali member");
        self.repo
            .get_diwali_user(id)
            .await?
            .ok_or_else(|| AppError::DiwaliUserNotFound(id.to_string()))
    }

    /// List all scheme members.
    pub async fn list_diwali_users(&self) -> Result<Vec<DiwaliUser>, AppError> {
        Ok(self.repo.list_diwali_users().await?)
    }

    /// Record a deposit.
    pub async fn post_deposit(
        &self,
        id: DiwaliUserId,
        amount: Rupees,
    ) -> Result<DepositResult, AppError> {
        validate_posting("Deposit", amount)?;

        let deposit = Deposit::contribution(amount, Utc::now());
        let total_saved = self
            .repo
            .post_deposit(id, &deposit)
            .await?
            .ok_or_else(|| AppError::DiwaliUserNotFound(id.to_string()))?;

        info!(user_id = %id, amount, total_saved, "deposit posted");
        Ok(DepositResult {
            deposit,
            total_saved,
        })
    }

    /// Apply admin overrides to a scheme member. Only the fields that are
    /// set are written; the bonus estimate stays as it was at enrollment.
    pub async fn edit_diwali_user(
        &self,
        id: DiwaliUserId,
        edit: DiwaliUserEdit,
    ) -> Result<DiwaliUser, AppError> {
        if let Some(contribution) = edit.contribution {
            if !is_allowed_contribution(contribution) {
                return Err(AppError::InvalidContribution(contribution));
            }
        }
        let changes = DiwaliUserChanges {
            name: edit.name.as_deref().map(validate_name).transpose()?,
            contact: edit.contact.map(|c| normalize(Some(c))),
            id_proof: edit.id_proof.map(|p| normalize(Some(p))),
            contribution: edit.contribution,
            frequency: edit.frequency,
            total_saved: edit
                .total_saved
                .map(|a| validate_stored("Total saved", a))
                .transpose()?,
        };

        if !self.repo.update_diwali_user(id, &changes).await? {
            return Err(AppError::DiwaliUserNotFound(id.to_string()));
        }
        let user = self.get_diwali_user(id).await?;
        info!(user_id = %id, "diwali member edited");
        Ok(user)
    }

    /// Delete a scheme member and its log. Returns the record as it was.
    pub async fn delete_diwali_user(&self, id: DiwaliUserId) -> Result<DiwaliUser, AppError> {
        let user = self.get_diwali_user(id).await?;
        if !self.repo.delete_diwali_user(id).await? {
            return Err(AppError::DiwaliUserNotFound(id.to_string()));
        }
        info!(user_id = %id, "diwali member deleted");
        Ok(user)
    }

    // ========================
    // Vault and reporting
    // ========================

    /// Record a manual vault correction.
    pub async fn adjust_vault(
        &self,
        amount: Rupees,
        reason: &str,
    ) -> Result<VaultAdjustment, AppError> {
        if amount == 0 {
            return Err(AppError::InvalidVaultAdjustment(
                "Amount must be non-zero".to_string(),
            ));
        }
        if amount.unsigned_abs() > MAX_AMOUNT.unsigned_abs() {
            return Err(over_limit("Adjustment"));
        }
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::InvalidVaultAdjustment(
                "A reason is required".to_string(),
            ));
        }

        let adjustment = VaultAdjustment::new(amount, reason);
        self.repo.save_vault_adjustment(&adjustment).await?;
        info!(amount, reason, "vault adjusted");
        Ok(adjustment)
    }

    /// List vault corrections in the order they were made.
    pub async fn list_vault_adjustments(&self) -> Result<Vec<VaultAdjustment>, AppError> {
        Ok(self.repo.list_vault_adjustments().await?)
    }

    /// Current cash position and headline counts.
    pub async fn vault_summary(&self) -> Result<VaultSummary, AppError> {
        let loans = self.repo.list_loan_users().await?;
        let savers = self.repo.list_diwali_users().await?;
        let adjustments = self.repo.list_vault_adjustments().await?;
        Ok(compute_vault_summary(
            self.config.initial_capital,
            &loans,
            &savers,
            &adjustments,
        ))
    }

    /// Combined transaction history, newest first.
    pub async fn history(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>, AppError> {
        let loans = self.repo.list_loan_users().await?;
        let savers = self.repo.list_diwali_users().await?;
        let mut entries = build_history(&loans, &savers);
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidName);
    }
    Ok(name.to_string())
}

/// Amounts moved by a single posting: positive and within the limit.
fn validate_posting(field: &str, amount: Rupees) -> Result<Rupees, AppError> {
    if amount <= 0 {
        return Err(AppError::InvalidAmount(format!("{} must be positive", field)));
    }
    if amount > MAX_AMOUNT {
        return Err(over_limit(field));
    }
    Ok(amount)
}

/// Totals overridden by an admin edit: non-negative and within the limit.
fn validate_stored(field: &str, amount: Rupees) -> Result<Rupees, AppError> {
    if amount < 0 {
        return Err(AppError::InvalidAmount(format!(
            "{} must not be negative",
            field
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(over_limit(field));
    }
    Ok(amount)
}

fn over_limit(field: &str) -> AppError {
    AppError::InvalidAmount(format!(
        "{} must not exceed {}",
        field,
        format_rupees(MAX_AMOUNT)
    ))
}

/// Blank optional text is stored as absent.
fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
