use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Rupees;

pub type AdjustmentId = Uuid;

/// Manual correction of the vault cash made from the admin panel.
/// Positive amounts add cash, negative amounts withdraw it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultAdjustment {
    pub id: AdjustmentId,
    pub amount: Rupees,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

impl VaultAdjustment {
    pub fn new(amount: Rupees, reason: impl Into<String>) -> Self {
        assert!(amount != 0, "Vault adjustment must be non-zero");
        Self {
            id: Uuid::new_v4(),
            amount,
            reason: reason.into(),
            recorded_at: Utc::now(),
        }
    }

    pub fn is_withdrawal(&self) -> bool {
        self.amount < 0
    }
}
