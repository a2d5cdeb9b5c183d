mod common;

use anyhow::Result;
use common::{account_id, date, post_simple, seeded_service};
use ledgerbook::application::AppError;
use ledgerbook::domain::NewJournalEntry;

#[tokio::test]
async fn test_account_ledger_running_balance() -> Result<()> {
    let (service, _temp) = seeded_service().await?;
    post_simple(&service, "2024-01-01", "Capital", "1000", "3000", 500000).await?;
    post_simple(&service, "2024-01-03", "Sale", "1000", "4000", 120000).await?;
    post_simple(&service, "2024-01-02", "Rent", "5300", "1000", 45000).await?;

    let cash = account_id(&service, "1000").await?;
    let ledger = service.get_account_ledger(cash, None, None).await?;

    let balances: Vec<_> = ledger.lines.iter().map(|l| (l.date, l.balance)).collect();
    assert_eq!(
        balances,
        vec![
            (date("2024-01-01"), 500000),
            (date("2024-01-02"), 455000),
            (date("2024-01-03"), 575000),
        ]
    );
    assert_eq!(ledger.opening_balance, 0);
    assert_eq!(ledger.closing_balance, 575000);

    Ok(())
}

#[tokio::test]
async fn test_credit_normal_account_balance_is_positive() -> Result<()> {
    let (service, _temp) = seeded_service().await?;
    post_simple(&service, "2024-01-05", "Supplier invoice", "1200", "2000", 50000).await?;
    post_simple(&service, "2024-01-20", "Part payment", "2000", "1010", 20000).await?;

    let payable = account_id(&service, "2000").await?;
    let ledger = service.get_account_ledger(payable, None, None).await?;

    assert_eq!(ledger.lines[0].balance, 50000);
    assert_eq!(ledger.lines[1].balance, 30000);
    assert_eq!(ledger.closing_balance, 30000);

    Ok(())
}

#[tokio::test]
async fn test_ledger_range_carries_opening_balance() -> Result<()> {
    let (service, _temp) = seeded_service().await?;
    post_simple(&service, "2024-01-15", "Jan sale", "1000", "4000", 10000).await?;
    post_simple(&service, "2024-01-31", "Jan sale", "1000", "4000", 5000).await?;
    post_simple(&service, "2024-02-01", "Feb sale", "1000", "4000", 2500).await?;
    post_simple(&service, "2024-03-01", "Mar sale", "1000", "4000", 1000).await?;

    let cash = account_id(&service, "1000").await?;
    let feb = service
        .get_account_ledger(cash, Some(date("2024-02-01")), Some(date("2024-02-29")))
        .await?;

    assert_eq!(feb.opening_balance, 15000);
    assert_eq!(feb.lines.len(), 1);
    assert_eq!(feb.lines[0].balance, 17500);
    assert_eq!(feb.closing_balance, 17500);

    Ok(())
}

#[tokio::test]
async fn test_same_day_entries_in_posting_order() -> Result<()> {
    let (service, _temp) = seeded_service().await?;
    let first = post_simple(&service, "2024-01-05", "First", "1000", "4000", 100).await?;
    let second = post_simple(&service, "2024-01-05", "Second", "1000", "4000", 200).await?;

    let cash = account_id(&service, "1000").await?;
    let ledger = service.get_account_ledger(cash, None, None).await?;

    let ids: Vec<_> = ledger.lines.iter().map(|l| l.entry_id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    assert_eq!(ledger.lines[1].memo, "Second");

    Ok(())
}

#[tokio::test]
async fn test_account_with_two_lines_in_one_entry() -> Result<()> {
    let (service, _temp) = seeded_service().await?;
    let cash = account_id(&service, "1000").await?;
    let sales = account_id(&service, "4000").await?;

    let entry = NewJournalEntry::new(date("2024-01-05"), "Two tills")
        .debit(cash, 3000)
        .debit(cash, 2000)
        .credit(sales, 5000);
    service.post_entry(entry).await?;

    let ledger = service.get_account_ledger(cash, None, None).await?;
    let balances: Vec<_> = ledger.lines.iter().map(|l| l.balance).collect();
    assert_eq!(balances, vec![3000, 5000]);

    Ok(())
}

#[tokio::test]
async fn test_ledger_unknown_account_and_bad_range() -> Result<()> {
    let (service, _temp) = seeded_service().await?;

    assert!(matches!(
        service.get_account_ledger(999_999, None, None).await,
        Err(AppError::UnknownAccount(_))
    ));

    let cash = account_id(&service, "1000").await?;
    assert!(matches!(
        service
            .get_account_ledger(cash, Some(date("2024-02-01")), Some(date("2024-01-01")))
            .await,
        Err(AppError::InvalidDateRange { .. })
    ));

    Ok(())
}
