// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use ledgerbook::application::{LedgerService, StatementSection};
use ledgerbook::domain::{AccountId, Cents, JournalEntry, NewJournalEntry};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Test service with the default chart of accounts installed
pub async fn seeded_service() -> Result<(LedgerService, TempDir)> {
    let (service, temp) = test_service().await?;
    service.seed_default_chart().await?;
    Ok((service, temp))
}

/// Helper to parse a date string (YYYY-MM-DD)
pub fn date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Look up an account id by code
pub async fn account_id(service: &LedgerService, code: &str) -> Result<AccountId> {
    Ok(service.get_account_by_code(code).await?.id)
}

/// Post a two-line entry: debit one account, credit another
pub async fn post_simple(
    service: &LedgerService,
    on: &str,
    memo: &str,
    debit_code: &str,
    credit_code: &str,
    amount: Cents,
) -> Result<JournalEntry> {
    let debit = account_id(service, debit_code).await?;
    let credit = account_id(service, credit_code).await?;
    let entry = NewJournalEntry::new(date(on), memo)
        .debit(debit, amount)
        .credit(credit, amount);
    Ok(service.post_entry(entry).await?)
}

/// Balance of the named account within a statement section
pub fn line_balance(section: &StatementSection, name: &str) -> Option<Cents> {
    section
        .lines
        .iter()
        .find(|l| l.name == name)
        .map(|l| l.balance)
}
