use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Cents, EntryId, NormalSide};

/// Raw debit/credit sums for one account over some window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTotals {
    pub debit: Cents,
    pub credit: Cents,
}

impl AccountTotals {
    /// Balance kept on the account's normal side.
    pub fn balance(&self, side: NormalSide) -> Cents {
        side.signed(self.debit, self.credit)
    }

    /// Debit-minus-credit, regardless of account type.
    pub fn net_debit(&self) -> Cents {
        self.debit - self.credit
    }
}

/// A stored journal line as seen from one account, before running balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub entry_id: EntryId,
    pub date: NaiveDate,
    pub memo: String,
    pub description: Option<String>,
    pub debit: Cents,
    pub credit: Cents,
}

/// A ledger line annotated with the account balance after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub entry_id: EntryId,
    pub date: NaiveDate,
    pub memo: String,
    pub description: Option<String>,
    pub debit: Cents,
    pub credit: Cents,
    pub balance: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("running balance overflows at entry #{entry_id}")]
pub struct BalanceOverflow {
    pub entry_id: EntryId,
}

/// Fold postings into running balances starting from `opening`.
/// Postings are sorted by (date, entry id) first; the sort is stable so
/// lines of the same entry keep their stored order.
pub fn running_balances(
    side: NormalSide,
    opening: Cents,
    mut postings: Vec<Posting>,
) -> Result<Vec<LedgerLine>, BalanceOverflow> {
    postings.sort_by_key(|p| (p.date, p.entry_id));

    let mut balance = opening;
    postings
        .into_iter()
        .map(|p| {
            balance = balance
                .checked_add(side.signed(p.debit, p.credit))
                .ok_or(BalanceOverflow {
                    entry_id: p.entry_id,
                })?;
            Ok(LedgerLine {
                entry_id: p.entry_id,
                date: p.date,
                memo: p.memo,
                description: p.description,
                debit: p.debit,
                credit: p.credit,
                balance,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn posting(entry_id: EntryId, d: &str, debit: Cents, credit: Cents) -> Posting {
        Posting {
            entry_id,
            date: date(d),
            memo: format!("entry {}", entry_id),
            description: None,
            debit,
            credit,
        }
    }

    #[test]
    fn test_running_balances_debit_normal() {
        let lines = running_balances(
            NormalSide::Debit,
            0,
            vec![
                posting(1, "2024-01-05", 100000, 0),
                posting(2, "2024-01-06", 0, 25000),
            ],
        )
        .unwrap();

        let balances: Vec<_> = lines.iter().map(|l| l.balance).collect();
        assert_eq!(balances, vec![100000, 75000]);
    }

    #[test]
    fn test_running_balances_credit_normal_with_opening() {
        let lines = running_balances(
            NormalSide::Credit,
            50000,
            vec![posting(4, "2024-02-01", 0, 10000), posting(5, "2024-02-02", 2000, 0)],
        )
        .unwrap();

        let balances: Vec<_> = lines.iter().map(|l| l.balance).collect();
        assert_eq!(balances, vec![60000, 58000]);
    }

    #[test]
    fn test_running_balances_orders_by_date_then_entry() {
        let lines = running_balances(
            NormalSide::Debit,
            0,
            vec![
                posting(9, "2024-01-10", 100, 0),
                posting(3, "2024-01-10", 200, 0),
                posting(12, "2024-01-02", 400, 0),
            ],
        )
        .unwrap();

        let order: Vec<_> = lines.iter().map(|l| l.entry_id).collect();
        assert_eq!(order, vec![12, 3, 9]);
        assert_eq!(lines.last().unwrap().balance, 700);
    }

    #[test]
    fn test_running_balances_overflow() {
        let huge = Cents::MAX / 2 + 1;
        let result = running_balances(
            NormalSide::Debit,
            0,
            vec![posting(1, "2024-01-01", huge, 0), posting(2, "2024-01-02", huge, 0)],
        );

        assert_eq!(result, Err(BalanceOverflow { entry_id: 2 }));
    }

    #[test]
    fn test_totals_balance_by_side() {
        let totals = AccountTotals {
            debit: 50000,
            credit: 20000,
        };

        assert_eq!(totals.balance(NormalSide::Debit), 30000);
        assert_eq!(totals.balance(NormalSide::Credit), -30000);
        assert_eq!(totals.net_debit(), 30000);
    }
}
