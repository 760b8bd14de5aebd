use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{DiwaliUser, HistoryEntry, LoanUser, VaultAdjustment, VaultSummary};

/// Full dump of the books, for backups and handing over to an accountant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub vault: VaultSummary,
    pub loan_users: Vec<LoanUser>,
    pub diwali_users: Vec<DiwaliUser>,
    pub vault_adjustments: Vec<VaultAdjustment>,
}

/// Exporter for converting ledger data to CSV or JSON
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Write history rows as CSV. Amounts are plain signed rupees.
    pub fn write_history_csv<W: Write>(entries: &[HistoryEntry], writer: W) -> Result<usize> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["date", "member", "source", "kind", "description", "amount"])?;

        for entry in entries {
            csv_writer.write_record(&[
                entry.date.to_rfc3339(),
                entry.member.clone(),
                entry.source.as_str().to_string(),
                entry.kind.as_str().to_string(),
                entry.description.clone(),
                entry.amount.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(entries.len())
    }

    /// Write history rows as a JSON array.
    pub fn write_history_json<W: Write>(entries: &[HistoryEntry], mut writer: W) -> Result<usize> {
        serde_json::to_writer_pretty(&mut writer, entries)?;
        writeln!(writer)?;
        Ok(entries.len())
    }

    /// Build a full snapshot of the books.
    pub async fn snapshot(&self) -> Result<LedgerSnapshot> {
        Ok(LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            vault: self.service.vault_summary().await?,
            loan_users: self.service.list_loan_users().await?,
            diwali_users: self.service.list_diwali_users().await?,
            vault_adjustments: self.service.list_vault_adjustments().await?,
        })
    }

    /// Export a full snapshot as JSON.
    pub async fn export_snapshot_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot> {
        let snapshot = self.snapshot().await?;
        serde_json::to_writer_pretty(&mut writer, &snapshot)?;
        writeln!(writer)?;
        Ok(snapshot)
    }
}
