use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DiwaliUser, LoanStatus, LoanUser, Rupees, TransactionKind, VaultAdjustment};

/// Derived cash position of the business. Nothing here is stored; it is
/// recomputed from the member records every time it is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSummary {
    pub initial_capital: Rupees,
    pub net_adjustments: Rupees,
    /// Face value of every loan on the books
    pub total_loans_given: Rupees,
    /// Cash handed out to borrowers (face value minus up-front interest)
    pub total_disbursed: Rupees,
    pub total_repaid: Rupees,
    /// Interest margin booked at disbursement
    pub interest_earned: Rupees,
    pub outstanding: Rupees,
    /// Cash available for lending
    pub loan_wallet: Rupees,
    /// Cash held for scheme members
    pub diwali_wallet: Rupees,
    pub loan_users_count: usize,
    pub active_loans: usize,
    pub completed_loans: usize,
    pub diwali_users_count: usize,
}

impl VaultSummary {
    /// Everything the business holds: lending cash plus scheme savings.
    pub fn total_cash(&self) -> Rupees {
        self.loan_wallet + self.diwali_wallet
    }
}

/// Compute the vault position from the full member lists.
/// loan_wallet = capital + adjustments - disbursed + repaid
pub fn compute_vault_summary(
    initial_capital: Rupees,
    loans: &[LoanUser],
    savers: &[DiwaliUser],
    adjustments: &[VaultAdjustment],
) -> VaultSummary {
    let net_adjustments: Rupees = adjustments.iter().map(|a| a.amount).sum();
    let total_loans_given: Rupees = loans.iter().map(|u| u.loan_amount).sum();
    let total_disbursed: Rupees = loans.iter().map(|u| u.disbursed_amount).sum();
    let total_repaid: Rupees = loans.iter().map(|u| u.paid_amount).sum();
    let outstanding: Rupees = loans.iter().map(|u| u.balance().max(0)).sum();
    let diwali_wallet: Rupees = savers.iter().map(|u| u.total_saved).sum();

    VaultSummary {
        initial_capital,
        net_adjustments,
        total_loans_given,
        total_disbursed,
        total_repaid,
        interest_earned: total_loans_given - total_disbursed,
        outstanding,
        loan_wallet: initial_capital + net_adjustments - total_disbursed + total_repaid,
        diwali_wallet,
        loan_users_count: loans.len(),
        active_loans: loans
            .iter()
            .filter(|u| u.status == LoanStatus::Active)
            .count(),
        completed_loans: loans
            .iter()
            .filter(|u| u.status == LoanStatus::Completed)
            .count(),
        diwali_users_count: savers.len(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySource {
    Loan,
    Scheme,
}

impl HistorySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistorySource::Loan => "loan",
            HistorySource::Scheme => "scheme",
        }
    }
}

/// One row of the combined transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: DateTime<Utc>,
    pub member: String,
    pub source: HistorySource,
    pub kind: TransactionKind,
    pub description: String,
    pub amount: Rupees,
}

/// Flatten every member log into one list, newest first.
pub fn build_history(loans: &[LoanUser], savers: &[DiwaliUser]) -> Vec<HistoryEntry> {
    let mut entries: Vec<HistoryEntry> = loans
        .iter()
        .flat_map(|user| {
            user.transactions.iter().map(move |tx| HistoryEntry {
                date: tx.date,
                member: user.name.clone(),
                source: HistorySource::Loan,
                kind: tx.kind,
                description: tx.description.clone(),
                amount: tx.amount,
            })
        })
        .collect();

    // Scheme deposits are money coming in
    entries.extend(savers.iter().flat_map(|user| {
        user.transactions.iter().map(move |dep| HistoryEntry {
            date: dep.date,
            member: user.name.clone(),
            source: HistorySource::Scheme,
            kind: TransactionKind::Credit,
            description: dep.description.clone(),
            amount: dep.amount,
        })
    }));

    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries
}
