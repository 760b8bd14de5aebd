use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Rupees, TransactionId};

pub type DiwaliUserId = Uuid;

/// Weekly pledges until the festival, roughly eleven months.
pub const WEEKS_TILL_DIWALI: Rupees = 44;

/// Monthly pledges until the festival.
pub const MONTHS_TILL_DIWALI: Rupees = 11;

/// Festival bonus on total contributions, in percent.
pub const BONUS_PERCENT: Rupees = 10;

/// Share of savings forfeited on early withdrawal, in percent.
pub const EARLY_WITHDRAWAL_PENALTY_PERCENT: Rupees = 10;

/// Pledge amounts a member can sign up for.
pub const ALLOWED_CONTRIBUTIONS: [Rupees; 3] = [100, 1_000, 5_000];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "weekly" => Some(Frequency::Weekly),
            "monthly" => Some(Frequency::Monthly),
            _ => None,
        }
    }

    /// Number of pledges between enrollment and the festival.
    pub fn horizon_periods(&self) -> Rupees {
        match self {
            Frequency::Weekly => WEEKS_TILL_DIWALI,
            Frequency::Monthly => MONTHS_TILL_DIWALI,
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns true if `amount` is one of the offered pledge sizes.
pub fn is_allowed_contribution(amount: Rupees) -> bool {
    ALLOWED_CONTRIBUTIONS.contains(&amount)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsProjection {
    pub contribution: Rupees,
    pub frequency: Frequency,
    pub total_projected_contribution: Rupees,
    pub bonus: Rupees,
    pub estimated_payout: Rupees,
}

/// Project what a member collects at the festival if every pledge is paid.
pub fn project_savings(contribution: Rupees, frequency: Frequency) -> SavingsProjection {
    let total = contribution * frequency.horizon_periods();
    let bonus = total * BONUS_PERCENT / 100;
    SavingsProjection {
        contribution,
        frequency,
        total_projected_contribution: total,
        bonus,
        estimated_payout: total + bonus,
    }
}

/// What a member would walk away with if they left the scheme today.
pub fn early_withdrawal_value(total_saved: Rupees) -> Rupees {
    total_saved - total_saved * EARLY_WITHDRAWAL_PENALTY_PERCENT / 100
}

/// One deposit in a member's append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub id: TransactionId,
    pub date: DateTime<Utc>,
    pub description: String,
    pub amount: Rupees,
}

impl Deposit {
    pub fn new(amount: Rupees, description: impl Into<String>, date: DateTime<Utc>) -> Self {
        assert!(amount > 0, "Deposit amount must be positive");
        Self {
            id: Uuid::new_v4(),
            date,
            description: description.into(),
            amount,
        }
    }

    pub fn initial(amount: Rupees, date: DateTime<Utc>) -> Self {
        Self::new(amount, "initial contribution", date)
    }

    pub fn contribution(amount: Rupees, date: DateTime<Utc>) -> Self {
        Self::new(amount, "contribution", date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiwaliUser {
    pub id: DiwaliUserId,
    pub name: String,
    pub contact: Option<String>,
    pub id_proof: Option<String>,
    pub contribution: Rupees,
    pub frequency: Frequency,
    pub total_saved: Rupees,
    /// Fixed at enrollment from the projection; deposits never update it.
    pub estimated_bonus: Rupees,
    pub joined_on: NaiveDate,
    pub transactions: Vec<Deposit>,
}

impl DiwaliUser {
    /// Enroll a member. The first pledge is collected immediately.
    pub fn new(
        name: String,
        contribution: Rupees,
        frequency: Frequency,
        now: DateTime<Utc>,
    ) -> Self {
        let projection = project_savings(contribution, frequency);
        Self {
            id: Uuid::new_v4(),
            name,
            contact: None,
            id_proof: None,
            contribution,
            frequency,
            total_saved: contribution,
            estimated_bonus: projection.bonus,
            joined_on: now.date_naive(),
            transactions: vec![Deposit::initial(contribution, now)],
        }
    }

    /// Payout shown on the member page: live savings plus the bonus
    /// projected at enrollment.
    pub fn diwali_payout(&self) -> Rupees {
        self.total_saved + self.estimated_bonus
    }

    pub fn early_withdrawal_value(&self) -> Rupees {
        early_withdrawal_value(self.total_saved)
    }

    /// Sum of the deposit log, which should match `total_saved` unless an
    /// admin edit overrode it.
    pub fn logged_total(&self) -> Rupees {
        self.transactions.iter().map(|d| d.amount).sum()
    }
}
