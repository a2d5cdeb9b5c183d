use std::collections::HashMap;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, Sqlite, Transaction};
use tracing::debug;

use crate::domain::{
    Account, AccountId, AccountTotals, AccountType, Cents, EntryId, IntegrityStats, JournalEntry,
    JournalLine, NewAccount, NewJournalEntry, Posting,
};

use super::DATE_FORMAT;

const ACCOUNT_COLUMNS: &str =
    "id, code, name, account_type, description, created_at, archived_at";

/// A unit of work over the ledger database.
///
/// Wraps one SQLite transaction. Writes become visible to other sessions
/// only on [`commit`](Self::commit); reads within a session see a
/// consistent snapshot. Dropping the session rolls back.
pub struct LedgerSession {
    tx: Transaction<'static, Sqlite>,
}

impl LedgerSession {
    pub(super) fn new(tx: Transaction<'static, Sqlite>) -> Self {
        Self { tx }
    }

    pub async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .context("Failed to commit transaction")
    }

    pub async fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .await
            .context("Failed to roll back transaction")
    }

    // ========================
    // Account operations
    // ========================

    /// Insert a new account and return it with its assigned id.
    pub async fn insert_account(
        &mut self,
        account: &NewAccount,
        created_at: DateTime<Utc>,
    ) -> Result<Account> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (code, name, account_type, description, created_at, archived_at)
            VALUES (?, ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(&account.code)
        .bind(&account.name)
        .bind(account.account_type.as_str())
        .bind(&account.description)
        .bind(created_at.to_rfc3339())
        .execute(&mut *self.tx)
        .await
        .context("Failed to save account")?;

        Ok(Account {
            id: result.last_insert_rowid(),
            code: account.code.clone(),
            name: account.name.clone(),
            account_type: account.account_type,
            description: account.description.clone(),
            created_at,
            archived_at: None,
        })
    }

    pub async fn get_account(&mut self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM accounts WHERE id = ?",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to fetch account")?;

        row.as_ref().map(row_to_account).transpose()
    }

    pub async fn get_account_by_code(&mut self, code: &str) -> Result<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM accounts WHERE code = ?",
            ACCOUNT_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to fetch account by code")?;

        row.as_ref().map(row_to_account).transpose()
    }

    /// List accounts ordered by code, optionally restricted to one type.
    pub async fn list_accounts(
        &mut self,
        account_type: Option<AccountType>,
        include_archived: bool,
    ) -> Result<Vec<Account>> {
        let mut query = format!("SELECT {} FROM accounts WHERE 1=1", ACCOUNT_COLUMNS);
        if account_type.is_some() {
            query.push_str(" AND account_type = ?");
        }
        if !include_archived {
            query.push_str(" AND archived_at IS NULL");
        }
        query.push_str(" ORDER BY code");

        let mut sql_query = sqlx::query(&query);
        if let Some(at) = account_type {
            sql_query = sql_query.bind(at.as_str());
        }

        let rows = sql_query
            .fetch_all(&mut *self.tx)
            .await
            .context("Failed to list accounts")?;

        rows.iter().map(row_to_account).collect()
    }

    /// Archive an account (soft delete). History is kept.
    pub async fn archive_account(&mut self, id: AccountId, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE accounts SET archived_at = ? WHERE id = ? AND archived_at IS NULL")
            .bind(at.to_rfc3339())
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .context("Failed to archive account")?;
        Ok(())
    }

    // ========================
    // Journal operations
    // ========================

    /// Insert an entry and all of its lines. The caller validates first;
    /// nothing is visible until the session commits.
    pub async fn insert_entry(
        &mut self,
        entry: &NewJournalEntry,
        created_at: DateTime<Utc>,
    ) -> Result<JournalEntry> {
        let result = sqlx::query(
            r#"
            INSERT INTO journal_entries (entry_date, memo, created_at, reverses)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(entry.date.format(DATE_FORMAT).to_string())
        .bind(&entry.memo)
        .bind(created_at.to_rfc3339())
        .bind(entry.reverses)
        .execute(&mut *self.tx)
        .await
        .context("Failed to save journal entry")?;

        let entry_id = result.last_insert_rowid();

        for line in &entry.lines {
            sqlx::query(
                r#"
                INSERT INTO journal_lines (entry_id, account_id, description, debit_cents, credit_cents)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(entry_id)
            .bind(line.account_id)
            .bind(&line.description)
            .bind(line.debit)
            .bind(line.credit)
            .execute(&mut *self.tx)
            .await
            .context("Failed to save journal line")?;
        }

        debug!(entry_id, lines = entry.lines.len(), "inserted journal entry");

        Ok(JournalEntry {
            id: entry_id,
            date: entry.date,
            memo: entry.memo.clone(),
            created_at,
            reverses: entry.reverses,
            lines: entry.lines.clone(),
        })
    }

    pub async fn get_entry(&mut self, id: EntryId) -> Result<Option<JournalEntry>> {
        let row = sqlx::query(
            "SELECT id, entry_date, memo, created_at, reverses FROM journal_entries WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to fetch journal entry")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut entry = row_to_entry(&row)?;
        let lines = sqlx::query(
            r#"
            SELECT entry_id, account_id, description, debit_cents, credit_cents
            FROM journal_lines
            WHERE entry_id = ?
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&mut *self.tx)
        .await
        .context("Failed to fetch journal lines")?;

        entry.lines = lines.iter().map(row_to_line).collect();
        Ok(Some(entry))
    }

    /// Id of the entry that reverses `id`, if any.
    pub async fn find_reversal_of(&mut self, id: EntryId) -> Result<Option<EntryId>> {
        let row = sqlx::query("SELECT id FROM journal_entries WHERE reverses = ?")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .context("Failed to look up reversal")?;

        Ok(row.map(|r| r.get("id")))
    }

    /// List entries (with lines) dated within the inclusive range,
    /// ordered by (date, id).
    pub async fn list_entries(
        &mut self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<JournalEntry>> {
        let filter = DateFilter::new("e.entry_date", from, to);

        let entry_rows = filter
            .bind(sqlx::query(&format!(
                "SELECT e.id, e.entry_date, e.memo, e.created_at, e.reverses FROM journal_entries e WHERE 1=1{} ORDER BY e.entry_date, e.id",
                filter.clause()
            )))
            .fetch_all(&mut *self.tx)
            .await
            .context("Failed to list journal entries")?;

        let line_rows = filter
            .bind(sqlx::query(&format!(
                r#"
                SELECT l.entry_id, l.account_id, l.description, l.debit_cents, l.credit_cents
                FROM journal_lines l
                JOIN journal_entries e ON e.id = l.entry_id
                WHERE 1=1{}
                ORDER BY l.entry_id, l.id
                "#,
                filter.clause()
            )))
            .fetch_all(&mut *self.tx)
            .await
            .context("Failed to list journal lines")?;

        let mut lines_by_entry: HashMap<EntryId, Vec<JournalLine>> = HashMap::new();
        for row in &line_rows {
            let entry_id: EntryId = row.get("entry_id");
            lines_by_entry
                .entry(entry_id)
                .or_default()
                .push(row_to_line(row));
        }

        entry_rows
            .iter()
            .map(|row| {
                let mut entry = row_to_entry(row)?;
                entry.lines = lines_by_entry.remove(&entry.id).unwrap_or_default();
                Ok(entry)
            })
            .collect()
    }

    // ========================
    // Ledger queries
    // ========================

    /// Debit and credit sums for one account between two inclusive dates.
    pub async fn account_totals(
        &mut self,
        account_id: AccountId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<AccountTotals> {
        let filter = DateFilter::new("e.entry_date", from, to);
        let query = format!(
            r#"
            SELECT
                COALESCE(SUM(l.debit_cents), 0) as debit,
                COALESCE(SUM(l.credit_cents), 0) as credit
            FROM journal_lines l
            JOIN journal_entries e ON e.id = l.entry_id
            WHERE l.account_id = ?{}
            "#,
            filter.clause()
        );

        let row = filter
            .bind(sqlx::query(&query).bind(account_id))
            .fetch_one(&mut *self.tx)
            .await
            .context("Failed to compute account totals")?;

        Ok(AccountTotals {
            debit: row.get("debit"),
            credit: row.get("credit"),
        })
    }

    /// Debit and credit sums for every account with activity in the range.
    /// Accounts without lines are absent from the map.
    pub async fn all_account_totals(
        &mut self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<HashMap<AccountId, AccountTotals>> {
        let filter = DateFilter::new("e.entry_date", from, to);
        let query = format!(
            r#"
            SELECT
                l.account_id as account_id,
                COALESCE(SUM(l.debit_cents), 0) as debit,
                COALESCE(SUM(l.credit_cents), 0) as credit
            FROM journal_lines l
            JOIN journal_entries e ON e.id = l.entry_id
            WHERE 1=1{}
            GROUP BY l.account_id
            "#,
            filter.clause()
        );

        let rows = filter
            .bind(sqlx::query(&query))
            .fetch_all(&mut *self.tx)
            .await
            .context("Failed to compute account totals")?;

        Ok(rows
            .iter()
            .map(|row| {
                (
                    row.get("account_id"),
                    AccountTotals {
                        debit: row.get("debit"),
                        credit: row.get("credit"),
                    },
                )
            })
            .collect())
    }

    /// Lines posted to one account in the range, ordered by
    /// (date, entry id, line id).
    pub async fn postings_for_account(
        &mut self,
        account_id: AccountId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Posting>> {
        let filter = DateFilter::new("e.entry_date", from, to);
        let query = format!(
            r#"
            SELECT l.entry_id, e.entry_date, e.memo, l.description, l.debit_cents, l.credit_cents
            FROM journal_lines l
            JOIN journal_entries e ON e.id = l.entry_id
            WHERE l.account_id = ?{}
            ORDER BY e.entry_date, l.entry_id, l.id
            "#,
            filter.clause()
        );

        let rows = filter
            .bind(sqlx::query(&query).bind(account_id))
            .fetch_all(&mut *self.tx)
            .await
            .context("Failed to list account postings")?;

        rows.iter()
            .map(|row| {
                Ok(Posting {
                    entry_id: row.get("entry_id"),
                    date: parse_date(row.get("entry_date"))?,
                    memo: row.get("memo"),
                    description: row.get("description"),
                    debit: row.get("debit_cents"),
                    credit: row.get("credit_cents"),
                })
            })
            .collect()
    }

    // ========================
    // Integrity
    // ========================

    /// Gather the facts needed to verify ledger invariants.
    pub async fn integrity_stats(&mut self) -> Result<IntegrityStats> {
        let account_count: i64 = sqlx::query("SELECT COUNT(*) as count FROM accounts")
            .fetch_one(&mut *self.tx)
            .await
            .context("Failed to count accounts")?
            .get("count");

        let entry_count: i64 = sqlx::query("SELECT COUNT(*) as count FROM journal_entries")
            .fetch_one(&mut *self.tx)
            .await
            .context("Failed to count journal entries")?
            .get("count");

        let totals = sqlx::query(
            r#"
            SELECT
                COUNT(*) as count,
                COALESCE(SUM(debit_cents), 0) as debit,
                COALESCE(SUM(credit_cents), 0) as credit
            FROM journal_lines
            "#,
        )
        .fetch_one(&mut *self.tx)
        .await
        .context("Failed to total journal lines")?;

        let unbalanced_entries: Vec<(EntryId, Cents, Cents)> = sqlx::query(
            r#"
            SELECT entry_id, SUM(debit_cents) as debit, SUM(credit_cents) as credit
            FROM journal_lines
            GROUP BY entry_id
            HAVING SUM(debit_cents) != SUM(credit_cents)
            ORDER BY entry_id
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .context("Failed to check entry balances")?
        .iter()
        .map(|row| (row.get("entry_id"), row.get("debit"), row.get("credit")))
        .collect();

        let short_entries: Vec<(EntryId, i64)> = sqlx::query(
            r#"
            SELECT e.id as entry_id, COUNT(l.id) as count
            FROM journal_entries e
            LEFT JOIN journal_lines l ON l.entry_id = e.id
            GROUP BY e.id
            HAVING COUNT(l.id) < 2
            ORDER BY e.id
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .context("Failed to check entry line counts")?
        .iter()
        .map(|row| (row.get("entry_id"), row.get("count")))
        .collect();

        let malformed_lines: Vec<(i64, EntryId)> = sqlx::query(
            r#"
            SELECT id, entry_id
            FROM journal_lines
            WHERE debit_cents < 0
               OR credit_cents < 0
               OR (debit_cents = 0) = (credit_cents = 0)
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .context("Failed to check journal lines")?
        .iter()
        .map(|row| (row.get("id"), row.get("entry_id")))
        .collect();

        let orphan_lines: Vec<(i64, AccountId)> = sqlx::query(
            r#"
            SELECT l.id, l.account_id
            FROM journal_lines l
            WHERE NOT EXISTS (SELECT 1 FROM accounts a WHERE a.id = l.account_id)
            ORDER BY l.id
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .context("Failed to check account references")?
        .iter()
        .map(|row| (row.get("id"), row.get("account_id")))
        .collect();

        Ok(IntegrityStats {
            account_count,
            entry_count,
            line_count: totals.get("count"),
            total_debits: totals.get("debit"),
            total_credits: totals.get("credit"),
            unbalanced_entries,
            short_entries,
            malformed_lines,
            orphan_lines,
        })
    }
}

/// Optional inclusive date bounds on a date column.
struct DateFilter {
    column: &'static str,
    from: Option<String>,
    to: Option<String>,
}

impl DateFilter {
    fn new(column: &'static str, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self {
            column,
            from: from.map(|d| d.format(DATE_FORMAT).to_string()),
            to: to.map(|d| d.format(DATE_FORMAT).to_string()),
        }
    }

    fn clause(&self) -> String {
        let mut clause = String::new();
        if self.from.is_some() {
            clause.push_str(&format!(" AND {} >= ?", self.column));
        }
        if self.to.is_some() {
            clause.push_str(&format!(" AND {} <= ?", self.column));
        }
        clause
    }

    fn bind<'q>(
        &'q self,
        mut query: sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    ) -> sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
        if let Some(from) = &self.from {
            query = query.bind(from.as_str());
        }
        if let Some(to) = &self.to {
            query = query.bind(to.as_str());
        }
        query
    }
}

fn parse_date(s: String) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&s, DATE_FORMAT).with_context(|| format!("Invalid date: {}", s))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid timestamp: {}", s))?
        .with_timezone(&Utc))
}

fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
    let account_type_str: String = row.get("account_type");
    let created_at_str: String = row.get("created_at");
    let archived_at_str: Option<String> = row.get("archived_at");

    Ok(Account {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
        account_type: account_type_str
            .parse::<AccountType>()
            .map_err(|e| anyhow::anyhow!("Invalid stored account type: {}", e))?,
        description: row.get("description"),
        created_at: parse_timestamp(&created_at_str).context("Invalid created_at timestamp")?,
        archived_at: archived_at_str
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .context("Invalid archived_at timestamp")?,
    })
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<JournalEntry> {
    let created_at_str: String = row.get("created_at");

    Ok(JournalEntry {
        id: row.get("id"),
        date: parse_date(row.get("entry_date"))?,
        memo: row.get("memo"),
        created_at: parse_timestamp(&created_at_str).context("Invalid created_at timestamp")?,
        reverses: row.get("reverses"),
        lines: Vec::new(),
    })
}

fn row_to_line(row: &sqlx::sqlite::SqliteRow) -> JournalLine {
    JournalLine {
        account_id: row.get("account_id"),
        debit: row.get("debit_cents"),
        credit: row.get("credit_cents"),
        description: row.get("description"),
    }
}
