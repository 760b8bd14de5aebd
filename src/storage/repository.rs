use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Deposit, DiwaliUser, DiwaliUserId, Frequency, LoanStatus, LoanTransaction, LoanType,
    LoanUser, LoanUserId, Rupees, TransactionKind, VaultAdjustment,
};

use super::MIGRATION_001_INITIAL;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Running totals of a borrower right after a repayment was posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepaymentTotals {
    pub paid_amount: Rupees,
    pub status: LoanStatus,
}

/// Admin overrides for a borrower. `None` leaves the column untouched;
/// `Some(None)` clears an optional column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanUserChanges {
    pub name: Option<String>,
    pub contact: Option<Option<String>>,
    pub id_proof: Option<Option<String>>,
    pub loan_amount: Option<Rupees>,
    pub paid_amount: Option<Rupees>,
}

/// Admin overrides for a scheme member, same conventions as
/// [`LoanUserChanges`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiwaliUserChanges {
    pub name: Option<String>,
    pub contact: Option<Option<String>>,
    pub id_proof: Option<Option<String>>,
    pub contribution: Option<Rupees>,
    pub frequency: Option<Frequency>,
    pub total_saved: Option<Rupees>,
}

/// Repository for persisting and querying scheme members, borrowers and
/// vault adjustments.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Loan users
    // ========================

    /// Save a new borrower together with its initial transaction log.
    pub async fn save_loan_user(&self, user: &LoanUser) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO loan_users (id, name, contact, id_proof, loan_type, loan_amount, disbursed_amount, paid_amount, status, joined_on, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.contact)
        .bind(&user.id_proof)
        .bind(user.loan_type.as_str())
        .bind(user.loan_amount)
        .bind(user.disbursed_amount)
        .bind(user.paid_amount)
        .bind(user.status.as_str())
        .bind(user.joined_on.format(DATE_FORMAT).to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to save loan user")?;

        for transaction in &user.transactions {
            sqlx::query(
                r#"
                INSERT INTO loan_transactions (id, user_id, date, description, kind, amount)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(transaction.id.to_string())
            .bind(user.id.to_string())
            .bind(transaction.date.to_rfc3339())
            .bind(&transaction.description)
            .bind(transaction.kind.as_str())
            .bind(transaction.amount)
            .execute(&mut *tx)
            .await
            .context("Failed to save loan transaction")?;
        }

        tx.commit().await.context("Failed to commit loan user")?;
        Ok(())
    }

    /// Get a borrower by ID, including its transaction log.
    pub async fn get_loan_user(&self, id: LoanUserId) -> Result<Option<LoanUser>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, contact, id_proof, loan_type, loan_amount, disbursed_amount, paid_amount, status, joined_on
            FROM loan_users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch loan user")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut user = Self::row_to_loan_user(&row)?;
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, date, description, kind, amount
            FROM loan_transactions
            WHERE user_id = ?
            ORDER BY seq
            "#,
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch loan transactions")?;

        user.transactions = rows
            .iter()
            .map(Self::row_to_loan_transaction)
            .collect::<Result<_>>()?;
        Ok(Some(user))
    }

    /// List all borrowers by name, each with its transaction log.
    pub async fn list_loan_users(&self) -> Result<Vec<LoanUser>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, contact, id_proof, loan_type, loan_amount, disbursed_amount, paid_amount, status, joined_on
            FROM loan_users
            ORDER BY name, joined_on
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list loan users")?;

        let mut users: Vec<LoanUser> = rows
            .iter()
            .map(Self::row_to_loan_user)
            .collect::<Result<_>>()?;

        let tx_rows = sqlx::query(
            "SELECT id, user_id, date, description, kind, amount FROM loan_transactions ORDER BY seq",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list loan transactions")?;

        let mut by_user: HashMap<Uuid, Vec<LoanTransaction>> = HashMap::new();
        for row in &tx_rows {
            let user_id_str: String = row.try_get("user_id")?;
            let user_id = Uuid::parse_str(&user_id_str).context("Invalid loan user ID")?;
            by_user
                .entry(user_id)
                .or_default()
                .push(Self::row_to_loan_transaction(row)?);
        }

        for user in &mut users {
            user.transactions = by_user.remove(&user.id).unwrap_or_default();
        }
        Ok(users)
    }

    /// Apply admin overrides in a single statement. Only the columns named
    /// in `changes` are written, so a concurrent repayment is never undone,
    /// and the status is re-derived from the stored values. Returns false if
    /// the borrower does not exist.
    pub async fn update_loan_user(&self, id: LoanUserId, changes: &LoanUserChanges) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE loan_users
            SET name = COALESCE(?, name),
                contact = CASE WHEN ? THEN ? ELSE contact END,
                id_proof = CASE WHEN ? THEN ? ELSE id_proof END,
                loan_amount = COALESCE(?, loan_amount),
                paid_amount = COALESCE(?, paid_amount),
                status = CASE
                    WHEN COALESCE(?, loan_amount) = 0 THEN 'no-loan'
                    WHEN COALESCE(?, paid_amount) >= COALESCE(?, loan_amount) THEN 'completed'
                    ELSE 'active'
                END
            WHERE id = ?
            "#,
        )
        .bind(&changes.name)
        .bind(changes.contact.is_some())
        .bind(changes.contact.clone().flatten())
        .bind(changes.id_proof.is_some())
        .bind(changes.id_proof.clone().flatten())
        .bind(changes.loan_amount)
        .bind(changes.paid_amount)
        .bind(changes.loan_amount)
        .bind(changes.paid_amount)
        .bind(changes.loan_amount)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update loan user")?;

        Ok(result.rows_affected() > 0)
    }

    /// Post a repayment atomically: the running total is incremented in SQL,
    /// the status recomputed from the stored values and the credit appended,
    /// all inside one transaction. Returns None if the borrower is unknown.
    pub async fn post_repayment(
        &self,
        id: LoanUserId,
        transaction: &LoanTransaction,
    ) -> Result<Option<RepaymentTotals>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let row = sqlx::query(
            r#"
            UPDATE loan_users
            SET paid_amount = paid_amount + ?,
                status = CASE
                    WHEN loan_amount = 0 THEN 'no-loan'
                    WHEN paid_amount + ? >= loan_amount THEN 'completed'
                    ELSE 'active'
                END
            WHERE id = ?
            RETURNING paid_amount, status
            "#,
        )
        .bind(transaction.amount)
        .bind(transaction.amount)
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to increment paid amount")?;

        let Some(row) = row else {
            tx.rollback().await.context("Failed to roll back repayment")?;
            return Ok(None);
        };

        let status_str: String = row.try_get("status")?;
        let totals = RepaymentTotals {
            paid_amount: row.try_get("paid_amount")?,
            status: LoanStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid loan status: {}", status_str))?,
        };

        sqlx::query(
            r#"
            INSERT INTO loan_transactions (id, user_id, date, description, kind, amount)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(transaction.id.to_string())
        .bind(id.to_string())
        .bind(transaction.date.to_rfc3339())
        .bind(&transaction.description)
        .bind(transaction.kind.as_str())
        .bind(transaction.amount)
        .execute(&mut *tx)
        .await
        .context("Failed to append repayment")?;

        tx.commit().await.context("Failed to commit repayment")?;
        Ok(Some(totals))
    }

    /// Delete a borrower and its log. Returns false if nothing was deleted.
    pub async fn delete_loan_user(&self, id: LoanUserId) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM loan_transactions WHERE user_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete loan transactions")?;

        let result = sqlx::query("DELETE FROM loan_users WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete loan user")?;

        tx.commit().await.context("Failed to commit delete")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_loan_user(row: &sqlx::sqlite::SqliteRow) -> Result<LoanUser> {
        let id_str: String = row.try_get("id")?;
        let loan_type_str: String = row.try_get("loan_type")?;
        let status_str: String = row.try_get("status")?;
        let joined_on_str: String = row.try_get("joined_on")?;

        Ok(LoanUser {
            id: Uuid::parse_str(&id_str).context("Invalid loan user ID")?,
            name: row.try_get("name")?,
            contact: row.try_get("contact")?,
            id_proof: row.try_get("id_proof")?,
            loan_type: LoanType::from_str(&loan_type_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid loan type: {}", loan_type_str))?,
            loan_amount: row.try_get("loan_amount")?,
            disbursed_amount: row.try_get("disbursed_amount")?,
            paid_amount: row.try_get("paid_amount")?,
            status: LoanStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid loan status: {}", status_str))?,
            joined_on: NaiveDate::parse_from_str(&joined_on_str, DATE_FORMAT)
                .context("Invalid joined_on date")?,
            transactions: Vec::new(),
        })
    }

    fn row_to_loan_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<LoanTransaction> {
        let id_str: String = row.try_get("id")?;
        let date_str: String = row.try_get("date")?;
        let kind_str: String = row.try_get("kind")?;

        Ok(LoanTransaction {
            id: Uuid::parse_str(&id_str).context("Invalid transaction ID")?,
            date: parse_timestamp(&date_str)?,
            description: row.try_get("description")?,
            kind: TransactionKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction kind: {}", kind_str))?,
            amount: row.try_get("amount")?,
        })
    }

    // ========================
    // Diwali scheme members
    // ========================

    /// Save a new scheme member together with its deposit log.
    pub async fn save_diwali_user(&self, user: &DiwaliUser) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO diwali_users (id, name, contact, id_proof, contribution, frequency, total_saved, estimated_bonus, joined_on, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.contact)
        .bind(&user.id_proof)
        .bind(user.contribution)
        .bind(user.frequency.as_str())
        .bind(user.total_saved)
        .bind(user.estimated_bonus)
        .bind(user.joined_on.format(DATE_FORMAT).to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to save diwali user")?;

        for deposit in &user.transactions {
            Self::insert_deposit(&mut tx, user.id, deposit).await?;
        }

        tx.commit().await.context("Failed to commit diwali user")?;
        Ok(())
    }

    async fn insert_deposit(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        user_id: DiwaliUserId,
        deposit: &Deposit,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO diwali_transactions (id, user_id, date, description, amount)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(deposit.id.to_string())
        .bind(user_id.to_string())
        .bind(deposit.date.to_rfc3339())
        .bind(&deposit.description)
        .bind(deposit.amount)
        .execute(&mut **tx)
        .await
        .context("Failed to save deposit")?;
        Ok(())
    }

    /// Get a scheme member by ID, including its deposit log.
    pub async fn get_diwali_user(&self, id: DiwaliUserId) -> Result<Option<DiwaliUser>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, contact, id_proof, contribution, frequency, total_saved, estimated_bonus, joined_on
            FROM diwali_users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch diwali user")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut user = Self::row_to_diwali_user(&row)?;
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, date, description, amount
            FROM diwali_transactions
            WHERE user_id = ?
            ORDER BY seq
            "#,
        )
        .bind(id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch deposits")?;

        user.transactions = rows
            .iter()
            .map(Self::row_to_deposit)
            .collect::<Result<_>>()?;
        Ok(Some(user))
    }

    /// List all scheme members by name, each with its deposit log.
    pub async fn list_diwali_users(&self) -> Result<Vec<DiwaliUser>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, contact, id_proof, contribution, frequency, total_saved, estimated_bonus, joined_on
            FROM diwali_users
            ORDER BY name, joined_on
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list diwali users")?;

        let mut users: Vec<DiwaliUser> = rows
            .iter()
            .map(Self::row_to_diwali_user)
            .collect::<Result<_>>()?;

        let dep_rows = sqlx::query(
            "SELECT id, user_id, date, description, amount FROM diwali_transactions ORDER BY seq",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list deposits")?;

        let mut by_user: HashMap<Uuid, Vec<Deposit>> = HashMap::new();
        for row in &dep_rows {
            let user_id_str: String = row.try_get("user_id")?;
            let user_id = Uuid::parse_str(&user_id_str).context("Invalid diwali user ID")?;
            by_user
                .entry(user_id)
                .or_default()
                .push(Self::row_to_deposit(row)?);
        }

        for user in &mut users {
            user.transactions = by_user.remove(&user.id).unwrap_or_default();
        }
        Ok(users)
    }

    /// Apply admin overrides in a single statement. Only the columns named
    /// in `changes` are written, so a concurrent deposit is never undone.
    /// The stored bonus estimate is left alone. Returns false if the member
    /// does not exist.
    pub async fn update_diwali_user(
        &self,
        id: DiwaliUserId,
        changes: &DiwaliUserChanges,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE diwali_users
            SET name = COALESCE(?, name),
                contact = CASE WHEN ? THEN ? ELSE contact END,
                id_proof = CASE WHEN ? THEN ? ELSE id_proof END,
                contribution = COALESCE(?, contribution),
                frequency = COALESCE(?, frequency),
                total_saved = COALESCE(?, total_saved)
            WHERE id = ?
            "#,
        )
        .bind(&changes.name)
        .bind(changes.contact.is_some())
        .bind(changes.contact.clone().flatten())
        .bind(changes.id_proof.is_some())
        .bind(changes.id_proof.clone().flatten())
        .bind(changes.contribution)
        .bind(changes.frequency.map(|f| f.as_str()))
        .bind(changes.total_saved)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update diwali user")?;

        Ok(result.rows_affected() > 0)
    }

    /// Post a deposit atomically. Returns the new total saved, or None if
    /// the member is unknown.
    pub async fn post_deposit(&self, id: DiwaliUserId, deposit: &Deposit) -> Result<Option<Rupees>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let row = sqlx::query(
            r#"
            UPDATE diwali_users
            SET total_saved = total_saved + ?
            WHERE id = ?
            RETURNING total_saved
            "#,
        )
        .bind(deposit.amount)
        .bind(id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to increment total saved")?;

        let Some(row) = row else {
            tx.rollback().await.context("Failed to roll back deposit")?;
            return Ok(None);
        };
        let total_saved: Rupees = row.try_get("total_saved")?;

        Self::insert_deposit(&mut tx, id, deposit).await?;

        tx.commit().await.context("Failed to commit deposit")?;
        Ok(Some(total_saved))
    }

    /// Delete a scheme member and its log. Returns false if nothing was deleted.
    pub async fn delete_diwali_user(&self, id: DiwaliUserId) -> Result<bool> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM diwali_transactions WHERE user_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete deposits")?;

        let result = sqlx::query("DELETE FROM diwali_users WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to delete diwali user")?;

        tx.commit().await.context("Failed to commit delete")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_diwali_user(row: &sqlx::sqlite::SqliteRow) -> Result<DiwaliUser> {
        let id_str: String = row.try_get("id")?;
        let frequency_str: String = row.try_get("frequency")?;
        let joined_on_str: String = row.try_get("joined_on")?;

        Ok(DiwaliUser {
            id: Uuid::parse_str(&id_str).context("Invalid diwali user ID")?,
            name: row.try_get("name")?,
            contact: row.try_get("contact")?,
            id_proof: row.try_get("id_proof")?,
            contribution: row.try_get("contribution")?,
            frequency: Frequency::from_str(&frequency_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid frequency: {}", frequency_str))?,
            total_saved: row.try_get("total_saved")?,
            estimated_bonus: row.try_get("estimated_bonus")?,
            joined_on: NaiveDate::parse_from_str(&joined_on_str, DATE_FORMAT)
                .context("Invalid joined_on date")?,
            transactions: Vec::new(),
        })
    }

    fn row_to_deposit(row: &sqlx::sqlite::SqliteRow) -> Result<Deposit> {
        let id_str: String = row.try_get("id")?;
        let date_str: String = row.try_get("date")?;

        Ok(Deposit {
            id: Uuid::parse_str(&id_str).context("Invalid deposit ID")?,
            date: parse_timestamp(&date_str)?,
            description: row.try_get("description")?,
            amount: row.try_get("amount")?,
        })
    }

    // ========================
    // Vault adjustments
    // ========================

    /// Save a vault adjustment.
    pub async fn save_vault_adjustment(&self, adjustment: &VaultAdjustment) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO vault_adjustments (id, amount, reason, recorded_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(adjustment.id.to_string())
        .bind(adjustment.amount)
        .bind(&adjustment.reason)
        .bind(adjustment.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save vault adjustment")?;
        Ok(())
    }

    /// List all vault adjustments in the order they were recorded.
    pub async fn list_vault_adjustments(&self) -> Result<Vec<VaultAdjustment>> {
        let rows = sqlx::query(
            "SELECT id, amount, reason, recorded_at FROM vault_adjustments ORDER BY seq",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list vault adjustments")?;

        rows.iter()
            .map(|row| -> Result<VaultAdjustment> {
                let id_str: String = row.try_get("id")?;
                let recorded_at_str: String = row.try_get("recorded_at")?;
                Ok(VaultAdjustment {
                    id: Uuid::parse_str(&id_str).context("Invalid adjustment ID")?,
                    amount: row.try_get("amount")?,
                    reason: row.try_get("reason")?,
                    recorded_at: parse_timestamp(&recorded_at_str)?,
                })
            })
            .collect()
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .context("Invalid timestamp")?
        .with_timezone(&Utc))
}
