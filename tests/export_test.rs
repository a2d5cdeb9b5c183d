mod common;

use anyhow::Result;
use common::{date, post_simple, seeded_service};
use ledgerbook::domain::DEFAULT_CHART;
use ledgerbook::io::{Exporter, LedgerSnapshot};

#[tokio::test]
async fn test_export_accounts_csv() -> Result<()> {
    let (service, _temp) = seeded_service().await?;
    service.archive_account("5500").await?;

    let mut buffer = Vec::new();
    let count = Exporter::new(&service).export_accounts_csv(&mut buffer).await?;
    let csv = String::from_utf8(buffer)?;

    assert_eq!(count, DEFAULT_CHART.len());
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("code,name,type,normal_side,description,archived")
    );
    assert_eq!(lines.next(), Some("1000,Cash on Hand,asset,debit,,no"));
    assert!(csv.contains("5500,Bank Charges,expense,debit,,yes"));

    Ok(())
}

#[tokio::test]
async fn test_export_journal_csv_one_row_per_line() -> Result<()> {
    let (service, _temp) = seeded_service().await?;
    post_simple(&service, "2024-01-05", "Cash sale", "1000", "4000", 100000).await?;
    let rent = post_simple(&service, "2024-01-06", "Rent", "5300", "1010", 45000).await?;
    service.reverse_entry(rent.id, None, None).await?;

    let mut buffer = Vec::new();
    let count = Exporter::new(&service)
        .export_journal_csv(&mut buffer, None, None)
        .await?;
    let csv = String::from_utf8(buffer)?;

    assert_eq!(count, 6);
    assert!(csv.contains("1,2024-01-05,Cash sale,,1000,Cash on Hand,,1000.00,0.00"));
    assert!(csv.contains(",2,5300,Rent Expense,,0.00,450.00"));

    Ok(())
}

#[tokio::test]
async fn test_export_trial_balance_csv() -> Result<()> {
    let (service, _temp) = seeded_service().await?;
    post_simple(&service, "2024-01-05", "Cash sale", "1000", "4000", 100000).await?;

    let mut buffer = Vec::new();
    Exporter::new(&service)
        .export_trial_balance_csv(&mut buffer, date("2024-01-31"))
        .await?;
    let csv = String::from_utf8(buffer)?;

    assert_eq!(csv.lines().next(), Some("code,name,type,debit,credit"));
    assert!(csv.contains("4000,Sales Revenue,revenue,0.00,1000.00"));
    assert!(csv.trim_end().ends_with(",TOTAL,,1000.00,1000.00"));

    Ok(())
}

#[tokio::test]
async fn test_export_full_json() -> Result<()> {
    let (service, _temp) = seeded_service().await?;
    post_simple(&service, "2024-01-05", "Cash sale", "1000", "4000", 100000).await?;

    let mut buffer = Vec::new();
    let snapshot = Exporter::new(&service).export_full_json(&mut buffer).await?;

    let parsed: LedgerSnapshot = serde_json::from_slice(&buffer)?;
    assert_eq!(parsed.accounts.len(), snapshot.accounts.len());
    assert_eq!(parsed.entries.len(), 1);
    assert_eq!(parsed.entries[0].memo, "Cash sale");
    assert_eq!(parsed.entries[0].total_debits(), 100000);

    Ok(())
}
