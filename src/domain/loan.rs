use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Rupees;

pub type LoanUserId = Uuid;
pub type TransactionId = Uuid;

/// Largest principal a single borrower can be quoted.
pub const MAX_PRINCIPAL: Rupees = 50_000;

/// Principal moves in steps of this size on the quote controls.
pub const PRINCIPAL_STEP: Rupees = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanType {
    /// Flat loan, 10% deducted up front
    Normal,
    /// Equated monthly installment loan, 12% deducted up front
    Emi,
}

impl LoanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanType::Normal => "normal",
            LoanType::Emi => "emi",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Some(LoanType::Normal),
            "emi" => Some(LoanType::Emi),
            _ => None,
        }
    }

    /// Interest rate in whole percent.
    pub fn rate_percent(&self) -> Rupees {
        match self {
            LoanType::Normal => 10,
            LoanType::Emi => 12,
        }
    }
}

impl std::fmt::Display for LoanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snap a requested principal onto the quote grid: `[0, MAX_PRINCIPAL]`
/// in multiples of `PRINCIPAL_STEP`, rounding down.
pub fn clamp_principal(requested: Rupees) -> Rupees {
    let bounded = requested.clamp(0, MAX_PRINCIPAL);
    bounded - bounded % PRINCIPAL_STEP
}

/// Increment control: one step up, saturating at the maximum.
pub fn step_up(principal: Rupees) -> Rupees {
    (clamp_principal(principal) + PRINCIPAL_STEP).min(MAX_PRINCIPAL)
}

/// Decrement control: one step down, saturating at zero.
pub fn step_down(principal: Rupees) -> Rupees {
    (clamp_principal(principal) - PRINCIPAL_STEP).max(0)
}

/// Figures shown to the borrower before a loan is booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanQuote {
    pub principal: Rupees,
    pub loan_type: LoanType,
    pub interest: Rupees,
    /// Cash actually handed over; interest is taken up front.
    pub disbursed_amount: Rupees,
    /// The borrower repays the full face value.
    pub total_repayable: Rupees,
}

/// Quote a loan. The principal is clamped onto the quote grid first, which
/// keeps the interest an exact whole number of rupees.
pub fn quote_loan(requested: Rupees, loan_type: LoanType) -> LoanQuote {
    let principal = clamp_principal(requested);
    let interest = principal * loan_type.rate_percent() / 100;
    LoanQuote {
        principal,
        loan_type,
        interest,
        disbursed_amount: principal - interest,
        total_repayable: principal,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoanStatus {
    Active,
    Completed,
    NoLoan,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Completed => "completed",
            LoanStatus::NoLoan => "no-loan",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(LoanStatus::Active),
            "completed" => Some(LoanStatus::Completed),
            "no-loan" => Some(LoanStatus::NoLoan),
            _ => None,
        }
    }

    /// Status is a pure function of the two running totals.
    pub fn derive(loan_amount: Rupees, paid_amount: Rupees) -> Self {
        if loan_amount == 0 {
            LoanStatus::NoLoan
        } else if paid_amount >= loan_amount {
            LoanStatus::Completed
        } else {
            LoanStatus::Active
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money leaving the vault towards the borrower
    Debit,
    /// Money coming back from the borrower
    Credit,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Debit => "debit",
            TransactionKind::Credit => "credit",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debit" => Some(TransactionKind::Debit),
            "credit" => Some(TransactionKind::Credit),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry in a borrower's append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTransaction {
    pub id: TransactionId,
    pub date: DateTime<Utc>,
    pub description: String,
    pub kind: TransactionKind,
    /// Signed: disbursements are recorded as the negative face value.
    pub amount: Rupees,
}

impl LoanTransaction {
    pub fn disbursement(face_value: Rupees, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            description: "loan disbursed".to_string(),
            kind: TransactionKind::Debit,
            amount: -face_value,
        }
    }

    pub fn repayment(amount: Rupees, date: DateTime<Utc>) -> Self {
        assert!(amount > 0, "Repayment amount must be positive");
        Self {
            id: Uuid::new_v4(),
            date,
            description: "repayment".to_string(),
            kind: TransactionKind::Credit,
            amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanUser {
    pub id: LoanUserId,
    pub name: String,
    pub contact: Option<String>,
    pub id_proof: Option<String>,
    pub loan_type: LoanType,
    /// Face value the borrower owes.
    pub loan_amount: Rupees,
    /// Cash handed out at registration.
    pub disbursed_amount: Rupees,
    pub paid_amount: Rupees,
    pub status: LoanStatus,
    pub joined_on: NaiveDate,
    pub transactions: Vec<LoanTransaction>,
}

impl LoanUser {
    /// Book a loan from an accepted quote. The log starts with a single
    /// disbursement debit for the face value.
    pub fn new(name: String, quote: &LoanQuote, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            contact: None,
            id_proof: None,
            loan_type: quote.loan_type,
            loan_amount: quote.principal,
            disbursed_amount: quote.disbursed_amount,
            paid_amount: 0,
            status: LoanStatus::derive(quote.principal, 0),
            joined_on: now.date_naive(),
            transactions: vec![LoanTransaction::disbursement(quote.principal, now)],
        }
    }

    /// Remaining face value; negative when the borrower has overpaid.
    pub fn balance(&self) -> Rupees {
        self.loan_amount - self.paid_amount
    }
}
