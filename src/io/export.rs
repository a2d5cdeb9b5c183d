use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{format_cents, Account, JournalEntry};

/// Database snapshot for full export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub accounts: Vec<Account>,
    pub entries: Vec<JournalEntry>,
}

/// Exporter for converting ledger data to various formats
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export the chart of accounts to CSV format
    pub async fn export_accounts_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let accounts = self.service.list_accounts(None, true).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "code",
            "name",
            "type",
            "normal_side",
            "description",
            "archived",
        ])?;

        for account in &accounts {
            csv_writer.write_record([
                account.code.as_str(),
                account.name.as_str(),
                account.account_type.as_str(),
                account.normal_side().as_str(),
                account.description.as_deref().unwrap_or_default(),
                if account.is_archived() { "yes" } else { "no" },
            ])?;
        }

        csv_writer.flush()?;
        Ok(accounts.len())
    }

    /// Export journal lines to CSV format, one row per line
    pub async fn export_journal_csv<W: Write>(
        &self,
        writer: W,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<usize> {
        let entries = self.service.list_entries(from, to).await?;
        let accounts = self.service.account_index().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "entry_id",
            "date",
            "memo",
            "reverses",
            "account_code",
            "account_name",
            "description",
            "debit",
            "credit",
        ])?;

        let mut count = 0;
        for entry in &entries {
            for line in &entry.lines {
                let (code, name) = accounts
                    .get(&line.account_id)
                    .map(|a| (a.code.clone(), a.name.clone()))
                    .unwrap_or_else(|| (line.account_id.to_string(), String::new()));

                csv_writer.write_record([
                    entry.id.to_string(),
                    entry.date.to_string(),
                    entry.memo.clone(),
                    entry.reverses.map(|id| id.to_string()).unwrap_or_default(),
                    code,
                    name,
                    line.description.clone().unwrap_or_default(),
                    format_cents(line.debit),
                    format_cents(line.credit),
                ])?;
                count += 1;
            }
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the trial balance as of a date to CSV format
    pub async fn export_trial_balance_csv<W: Write>(
        &self,
        writer: W,
        as_of: NaiveDate,
    ) -> Result<usize> {
        let report = self.service.trial_balance(as_of).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["code", "name", "type", "debit", "credit"])?;
        for row in &report.rows {
            csv_writer.write_record([
                row.code.clone(),
                row.name.clone(),
                row.account_type.to_string(),
                format_cents(row.debit),
                format_cents(row.credit),
            ])?;
        }
        csv_writer.write_record([
            String::new(),
            "TOTAL".to_string(),
            String::new(),
            format_cents(report.total_debit),
            format_cents(report.total_credit),
        ])?;

        csv_writer.flush()?;
        Ok(report.rows.len())
    }

    /// Export accounts and all entries as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot> {
        let accounts = self.service.list_accounts(None, true).await?;
        let entries = self.service.list_entries(None, None).await?;

        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            accounts,
            entries,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
