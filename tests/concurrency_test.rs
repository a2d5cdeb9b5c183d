mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{account_id, date, seeded_service};
use ledgerbook::application::AppError;
use ledgerbook::domain::NewJournalEntry;

const WRITERS: usize = 40;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_posts_all_commit() -> Result<()> {
    let (service, _temp) = seeded_service().await?;
    let service = Arc::new(service);
    let cash = account_id(&service, "1000").await?;
    let sales = account_id(&service, "4000").await?;

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                let entry = NewJournalEntry::new(date("2024-01-05"), format!("Sale {}", i))
                    .debit(cash, 1000)
                    .credit(sales, 1000);
                service.post_entry(entry).await
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await??.id);
    }
    ids.sort_unstable();
    ids.dedup();

    assert_eq!(ids.len(), WRITERS);
    assert_eq!(service.list_entries(None, None).await?.len(), WRITERS);
    let ledger = service.get_account_ledger(cash, None, None).await?;
    assert_eq!(ledger.closing_balance, 1000 * WRITERS as i64);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_duplicate_account_codes() -> Result<()> {
    let (service, _temp) = seeded_service().await?;
    let service = Arc::new(service);

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .create_account("6000".into(), format!("Packaging {}", i), "expense", None)
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => created += 1,
            Err(AppError::AccountAlreadyExists(code)) => assert_eq!(code, "6000"),
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(created, 1);

    Ok(())
}
