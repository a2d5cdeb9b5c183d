use chrono::{Datelike, NaiveDate, Utc};
use std::collections::HashMap;
use tracing::{error, info, warn};

use crate::domain::{
    build_integrity_report, default_chart, running_balances, validate_lines, Account, AccountId,
    AccountType, Cents, EntryId, EntryStatus, IntegrityReport, JournalEntry, LedgerLine,
    NewAccount, NewJournalEntry,
};
use crate::storage::{LedgerSession, Repository};

use super::reporting::{
    build_balance_sheet, build_income_statement, build_trial_balance, AccountBalance,
    BalanceSheet, IncomeStatement, MonthToDateKpis, TrialBalance,
};
use super::AppError;

/// Account codes whose balances make up the dashboard cash figure.
pub const DEFAULT_CASH_ACCOUNTS: &[&str] = &["1000", "1010"];

/// Application service providing the posting and reporting engine.
/// This is the only writer of ledger state and the primary interface for
/// any client (CLI, web front end, etc.).
pub struct LedgerService {
    repo: Repository,
    cash_accounts: Vec<String>,
}

/// Result of reversing an entry
pub struct ReversalResult {
    pub reversal: JournalEntry,
    pub original: JournalEntry,
}

/// A posted entry together with its lifecycle state
pub struct EntryInfo {
    pub entry: JournalEntry,
    pub status: EntryStatus,
    pub reversed_by: Option<EntryId>,
}

/// Lines posted to one account with running balances
#[derive(Debug, Clone, serde::Serialize)]
pub struct AccountLedger {
    pub account: Account,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub opening_balance: Cents,
    pub lines: Vec<LedgerLine>,
    pub closing_balance: Cents,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            cash_accounts: DEFAULT_CASH_ACCOUNTS.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Initialize a database at the given path, creating it if needed.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Use a different set of account codes for the dashboard cash balance.
    pub fn with_cash_accounts(mut self, codes: Vec<String>) -> Self {
        self.cash_accounts = codes;
        self
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    // ========================
    // Account registry
    // ========================

    /// Create a new account. The normal balance side follows from the type.
    pub async fn create_account(
        &self,
        code: String,
        name: String,
        account_type: &str,
        description: Option<String>,
    ) -> Result<Account, AppError> {
        let account_type = account_type
            .parse::<AccountType>()
            .map_err(|e| AppError::InvalidAccountType(e.0))?;

        let code = code.trim().to_string();
        let name = name.trim().to_string();
        if code.is_empty() {
            return Err(AppError::InvalidInput("account code must not be empty".into()));
        }
        if name.is_empty() {
            return Err(AppError::InvalidInput("account name must not be empty".into()));
        }

        let mut new_account = NewAccount::new(code, name, account_type);
        if let Some(desc) = description {
            new_account = new_account.with_description(desc);
        }

        let mut session = self.repo.begin_write().await?;
        if session.get_account_by_code(&new_account.code).await?.is_some() {
            return Err(AppError::AccountAlreadyExists(new_account.code));
        }
        let account = session.insert_account(&new_account, Utc::now()).await?;
        session.commit().await?;

        info!(
            account_id = account.id,
            code = %account.code,
            account_type = %account.account_type,
            "created account"
        );
        Ok(account)
    }

    /// Install the default chart of accounts, skipping codes that exist.
    /// Returns the number of accounts created.
    pub async fn seed_default_chart(&self) -> Result<usize, AppError> {
        let mut session = self.repo.begin_write().await?;
        let mut created = 0;
        let now = Utc::now();

        for account in default_chart() {
            if session.get_account_by_code(&account.code).await?.is_none() {
                session.insert_account(&account, now).await?;
                created += 1;
            }
        }

        session.commit().await?;
        info!(created, "seeded default chart of accounts");
        Ok(created)
    }

    pub async fn get_account(&self, id: AccountId) -> Result<Account, AppError> {
        let mut session = self.repo.begin().await?;
        let account = session.get_account(id).await?;
        session.rollback().await?;
        account.ok_or_else(|| AppError::UnknownAccount(id.to_string()))
    }

    pub async fn get_account_by_code(&self, code: &str) -> Result<Account, AppError> {
        let mut session = self.repo.begin().await?;
        let account = session.get_account_by_code(code).await?;
        session.rollback().await?;
        account.ok_or_else(|| AppError::UnknownAccount(code.to_string()))
    }

    /// List accounts ordered by code, optionally filtered by type.
    pub async fn list_accounts(
        &self,
        filter: Option<AccountType>,
        include_archived: bool,
    ) -> Result<Vec<Account>, AppError> {
        let mut session = self.repo.begin().await?;
        let accounts = session.list_accounts(filter, include_archived).await?;
        session.rollback().await?;
        Ok(accounts)
    }

    /// Archive an account. Its history stays in every report but it
    /// accepts no new postings.
    pub async fn archive_account(&self, code: &str) -> Result<Account, AppError> {
        let mut session = self.repo.begin_write().await?;
        let mut account = session
            .get_account_by_code(code)
            .await?
            .ok_or_else(|| AppError::UnknownAccount(code.to_string()))?;

        if !account.is_archived() {
            let now = Utc::now();
            session.archive_account(account.id, now).await?;
            account.archived_at = Some(now);
        }
        session.commit().await?;

        info!(account_id = account.id, code = %account.code, "archived account");
        Ok(account)
    }

    /// Map of account id to account, archived ones included (for display).
    pub async fn account_index(&self) -> Result<HashMap<AccountId, Account>, AppError> {
        let accounts = self.list_accounts(None, true).await?;
        Ok(accounts.into_iter().map(|a| (a.id, a)).collect())
    }

    // ========================
    // Journal posting
    // ========================

    /// Validate and commit a journal entry atomically.
    /// Reversals go through [`reverse_entry`](Self::reverse_entry); a draft
    /// that sets `reverses` is rejected.
    pub async fn post_entry(&self, entry: NewJournalEntry) -> Result<JournalEntry, AppError> {
        if let Some(original) = entry.reverses {
            return Err(AppError::InvalidInput(format!(
                "use reverse_entry to reverse entry #{}",
                original
            )));
        }
        let total = validate_lines(&entry.lines)?;

        let mut session = self.repo.begin_write().await?;
        // Any early return drops the session, rolling back
        let posted = Self::insert_checked(&mut session, &entry, false).await?;
        session.commit().await?;

        info!(
            entry_id = posted.id,
            date = %posted.date,
            lines = posted.lines.len(),
            total,
            "posted journal entry"
        );
        Ok(posted)
    }

    /// Post the offsetting entry for `id`. Defaults to the original date.
    pub async fn reverse_entry(
        &self,
        id: EntryId,
        date: Option<NaiveDate>,
        memo: Option<String>,
    ) -> Result<ReversalResult, AppError> {
        let mut session = self.repo.begin_write().await?;

        let original = session
            .get_entry(id)
            .await?
            .ok_or(AppError::EntryNotFound(id))?;

        if original.is_reversal() {
            return Err(AppError::CannotReverseReversal(id));
        }
        if let Some(reversal) = session.find_reversal_of(id).await? {
            return Err(AppError::AlreadyReversed {
                original: id,
                reversal,
            });
        }

        let draft = original.create_reversal(date, memo);
        validate_lines(&draft.lines).map_err(|e| {
            error!(entry_id = id, error = %e, "stored entry fails validation");
            AppError::LedgerIntegrity(format!("entry #{} is invalid: {}", id, e))
        })?;

        let reversal = Self::insert_checked(&mut session, &draft, true).await?;
        session.commit().await?;

        info!(entry_id = reversal.id, reverses = id, "reversed journal entry");
        Ok(ReversalResult { reversal, original })
    }

    /// Check account references inside the session, then insert.
    async fn insert_checked(
        session: &mut LedgerSession,
        entry: &NewJournalEntry,
        allow_archived: bool,
    ) -> Result<JournalEntry, AppError> {
        for line in &entry.lines {
            let account = session
                .get_account(line.account_id)
                .await?
                .ok_or_else(|| AppError::UnknownAccount(line.account_id.to_string()))?;

            if account.is_archived() && !allow_archived {
                return Err(AppError::AccountArchived(account.code));
            }
        }

        Ok(session.insert_entry(entry, Utc::now()).await?)
    }

    /// Get a posted entry and whether it has been reversed.
    pub async fn get_entry(&self, id: EntryId) -> Result<EntryInfo, AppError> {
        let mut session = self.repo.begin().await?;
        let entry = session
            .get_entry(id)
            .await?
            .ok_or(AppError::EntryNotFound(id))?;
        let reversed_by = session.find_reversal_of(id).await?;
        session.rollback().await?;

        let status = if reversed_by.is_some() {
            EntryStatus::Reversed
        } else {
            EntryStatus::Posted
        };

        Ok(EntryInfo {
            entry,
            status,
            reversed_by,
        })
    }

    /// List entries within an inclusive date range in (date, id) order.
    pub async fn list_entries(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<JournalEntry>, AppError> {
        check_range(from, to)?;
        let mut session = self.repo.begin().await?;
        let entries = session.list_entries(from, to).await?;
        session.rollback().await?;
        Ok(entries)
    }

    // ========================
    // Ledger queries
    // ========================

    /// Lines for one account within the range with running balances.
    /// The opening balance folds in everything dated before `from`.
    pub async fn get_account_ledger(
        &self,
        account_id: AccountId,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<AccountLedger, AppError> {
        check_range(from, to)?;

        let mut session = self.repo.begin().await?;
        let account = session
            .get_account(account_id)
            .await?
            .ok_or_else(|| AppError::UnknownAccount(account_id.to_string()))?;
        let side = account.normal_side();

        let opening_balance = match from.and_then(|f| f.pred_opt()) {
            Some(day_before) => session
                .account_totals(account_id, None, Some(day_before))
                .await?
                .balance(side),
            None => 0,
        };

        let postings = session.postings_for_account(account_id, from, to).await?;
        session.rollback().await?;

        let lines = running_balances(side, opening_balance, postings).map_err(|e| {
            error!(account_id, error = %e, "account ledger overflows");
            AppError::LedgerIntegrity(format!("account {}: {}", account.code, e))
        })?;
        let closing_balance = lines.last().map(|l| l.balance).unwrap_or(opening_balance);

        Ok(AccountLedger {
            account,
            from,
            to,
            opening_balance,
            lines,
            closing_balance,
        })
    }

    // ========================
    // Reports
    // ========================

    /// Every account's balance as of a date in debit/credit columns.
    pub async fn trial_balance(&self, as_of: NaiveDate) -> Result<TrialBalance, AppError> {
        let mut session = self.repo.begin().await?;
        let accounts = session.list_accounts(None, true).await?;
        let totals = session.all_account_totals(None, Some(as_of)).await?;
        session.rollback().await?;

        let report = build_trial_balance(as_of, &accounts, &totals);
        if !report.is_balanced() {
            error!(
                %as_of,
                debits = report.total_debit,
                credits = report.total_credit,
                "trial balance does not balance"
            );
            return Err(AppError::LedgerIntegrity(format!(
                "trial balance as of {}: debits {} != credits {}",
                as_of, report.total_debit, report.total_credit
            )));
        }

        Ok(report)
    }

    /// Revenue less COGS and expenses for the inclusive period.
    pub async fn income_statement(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<IncomeStatement, AppError> {
        check_range(Some(from), Some(to))?;

        let mut session = self.repo.begin().await?;
        let accounts = session.list_accounts(None, true).await?;
        let totals = session.all_account_totals(Some(from), Some(to)).await?;
        session.rollback().await?;

        Ok(build_income_statement(from, to, &accounts, &totals))
    }

    /// Assets, liabilities and equity as of a date. Unclosed earnings are
    /// carried in equity so that the accounting equation holds.
    pub async fn balance_sheet(&self, as_of: NaiveDate) -> Result<BalanceSheet, AppError> {
        let mut session = self.repo.begin().await?;
        let accounts = session.list_accounts(None, true).await?;
        let totals = session.all_account_totals(None, Some(as_of)).await?;
        session.rollback().await?;

        let report = build_balance_sheet(as_of, &accounts, &totals);
        if !report.is_balanced() {
            error!(
                %as_of,
                assets = report.assets.total,
                liabilities_and_equity = report.total_liabilities_and_equity,
                "balance sheet does not balance"
            );
            return Err(AppError::LedgerIntegrity(format!(
                "balance sheet as of {}: assets {} != liabilities + equity {}",
                as_of, report.assets.total, report.total_liabilities_and_equity
            )));
        }

        Ok(report)
    }

    /// Dashboard figures from the first of `today`'s month through `today`.
    pub async fn month_to_date_kpis(&self, today: NaiveDate) -> Result<MonthToDateKpis, AppError> {
        let period_start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);

        let mut session = self.repo.begin().await?;
        let accounts = session.list_accounts(None, true).await?;
        let period_totals = session
            .all_account_totals(Some(period_start), Some(today))
            .await?;
        let cumulative_totals = session.all_account_totals(None, Some(today)).await?;
        session.rollback().await?;

        let statement = build_income_statement(period_start, today, &accounts, &period_totals);

        let mut cash_accounts = Vec::new();
        for code in &self.cash_accounts {
            let Some(account) = accounts.iter().find(|a| &a.code == code) else {
                warn!(code = %code, "configured cash account does not exist");
                continue;
            };
            let balance = cumulative_totals
                .get(&account.id)
                .map(|t| t.balance(account.normal_side()))
                .unwrap_or(0);
            cash_accounts.push(AccountBalance {
                account_id: account.id,
                code: account.code.clone(),
                name: account.name.clone(),
                account_type: account.account_type,
                balance,
            });
        }
        let cash_balance = cash_accounts.iter().map(|a| a.balance).sum();

        Ok(MonthToDateKpis {
            period_start,
            as_of: today,
            revenue: statement.revenue.total,
            cost_of_goods_sold: statement.cost_of_goods_sold.total,
            expenses: statement.expenses.total,
            gross_profit: statement.gross_profit,
            net_profit: statement.net_income,
            cash_balance,
            cash_accounts,
        })
    }

    // ========================
    // Integrity
    // ========================

    /// Scan the whole ledger for invariant violations.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        let mut session = self.repo.begin().await?;
        let stats = session.integrity_stats().await?;
        session.rollback().await?;

        let report = build_integrity_report(stats);
        if !report.is_ok() {
            warn!(issues = report.issues.len(), "ledger integrity check found problems");
        }
        Ok(report)
    }
}

fn check_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<(), AppError> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(AppError::InvalidDateRange { from, to }),
        _ => Ok(()),
    }
}
