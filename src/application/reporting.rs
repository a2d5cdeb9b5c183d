use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Account, AccountId, AccountTotals, AccountType, Cents};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalance {
    pub as_of: NaiveDate,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: Cents,
    pub total_credit: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub debit: Cents,
    pub credit: Cents,
}

impl TrialBalance {
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }
}

/// An account's balance on its normal side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub balance: Cents,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementSection {
    pub lines: Vec<AccountBalance>,
    pub total: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub revenue: StatementSection,
    pub cost_of_goods_sold: StatementSection,
    pub expenses: StatementSection,
    pub gross_profit: Cents,
    pub net_income: Cents,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    pub assets: StatementSection,
    pub liabilities: StatementSection,
    /// Equity accounts only; see `total_equity` for the section total.
    pub equity: StatementSection,
    /// Cumulative net income up to `as_of` not yet closed into equity.
    pub current_earnings: Cents,
    pub total_equity: Cents,
    pub total_liabilities_and_equity: Cents,
}

impl BalanceSheet {
    pub fn is_balanced(&self) -> bool {
        self.assets.total == self.total_liabilities_and_equity
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthToDateKpis {
    pub period_start: NaiveDate,
    pub as_of: NaiveDate,
    pub revenue: Cents,
    pub cost_of_goods_sold: Cents,
    pub expenses: Cents,
    pub gross_profit: Cents,
    pub net_profit: Cents,
    pub cash_balance: Cents,
    pub cash_accounts: Vec<AccountBalance>,
}

/// Build the trial balance from cumulative totals.
/// Archived accounts are listed only if they still carry activity.
pub fn build_trial_balance(
    as_of: NaiveDate,
    accounts: &[Account],
    totals: &HashMap<AccountId, AccountTotals>,
) -> TrialBalance {
    let mut rows = Vec::new();
    let mut total_debit = 0;
    let mut total_credit = 0;

    for account in accounts {
        let account_totals = totals.get(&account.id).copied().unwrap_or_default();
        if account.is_archived() && account_totals == AccountTotals::default() {
            continue;
        }

        let net = account_totals.net_debit();
        let (debit, credit) = if net >= 0 { (net, 0) } else { (0, -net) };
        total_debit += debit;
        total_credit += credit;

        rows.push(TrialBalanceRow {
            account_id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            account_type: account.account_type,
            debit,
            credit,
        });
    }

    TrialBalance {
        as_of,
        rows,
        total_debit,
        total_credit,
    }
}

/// Collect non-zero balances of the given account type.
pub fn build_section(
    account_type: AccountType,
    accounts: &[Account],
    totals: &HashMap<AccountId, AccountTotals>,
) -> StatementSection {
    let lines: Vec<AccountBalance> = accounts
        .iter()
        .filter(|a| a.account_type == account_type)
        .filter_map(|a| {
            let balance = totals.get(&a.id)?.balance(a.normal_side());
            (balance != 0).then(|| AccountBalance {
                account_id: a.id,
                code: a.code.clone(),
                name: a.name.clone(),
                account_type: a.account_type,
                balance,
            })
        })
        .collect();

    let total = lines.iter().map(|l| l.balance).sum();
    StatementSection { lines, total }
}

/// Build the income statement from totals restricted to `from..=to`.
pub fn build_income_statement(
    from: NaiveDate,
    to: NaiveDate,
    accounts: &[Account],
    totals: &HashMap<AccountId, AccountTotals>,
) -> IncomeStatement {
    let revenue = build_section(AccountType::Revenue, accounts, totals);
    let cost_of_goods_sold = build_section(AccountType::Cogs, accounts, totals);
    let expenses = build_section(AccountType::Expense, accounts, totals);

    let gross_profit = revenue.total - cost_of_goods_sold.total;
    let net_income = gross_profit - expenses.total;

    IncomeStatement {
        from,
        to,
        revenue,
        cost_of_goods_sold,
        expenses,
        gross_profit,
        net_income,
    }
}

/// Net income over whatever window `totals` covers.
pub fn net_income(accounts: &[Account], totals: &HashMap<AccountId, AccountTotals>) -> Cents {
    accounts
        .iter()
        .filter(|a| a.account_type.is_income_statement())
        .filter_map(|a| totals.get(&a.id).map(|t| (a, t)))
        .map(|(a, t)| match a.account_type {
            AccountType::Revenue => t.balance(a.normal_side()),
            _ => -t.balance(a.normal_side()),
        })
        .sum()
}

/// Build the balance sheet from cumulative totals up to `as_of`.
pub fn build_balance_sheet(
    as_of: NaiveDate,
    accounts: &[Account],
    totals: &HashMap<AccountId, AccountTotals>,
) -> BalanceSheet {
    let assets = build_section(AccountType::Asset, accounts, totals);
    let liabilities = build_section(AccountType::Liability, accounts, totals);
    let equity = build_section(AccountType::Equity, accounts, totals);
    let current_earnings = net_income(accounts, totals);

    let total_equity = equity.total + current_earnings;
    let total_liabilities_and_equity = liabilities.total + total_equity;

    BalanceSheet {
        as_of,
        assets,
        liabilities,
        equity,
        current_earnings,
        total_equity,
        total_liabilities_and_equity,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn account(id: AccountId, name: &str, account_type: AccountType) -> Account {
        Account {
            id,
            code: format!("{}", 1000 + id),
            name: name.into(),
            account_type,
            description: None,
            created_at: Utc::now(),
            archived_at: None,
        }
    }

    fn chart() -> Vec<Account> {
        vec![
            account(1, "Cash", AccountType::Asset),
            account(2, "Inventory", AccountType::Asset),
            account(3, "Accounts Payable", AccountType::Liability),
            account(4, "Owner's Equity", AccountType::Equity),
            account(5, "Sales Revenue", AccountType::Revenue),
            account(6, "Cost of Goods Sold", AccountType::Cogs),
            account(7, "Rent Expense", AccountType::Expense),
        ]
    }

    fn find<'a>(section: &'a StatementSection, name: &str) -> Option<&'a AccountBalance> {
        section.lines.iter().find(|l| l.name == name)
    }

    fn totals(entries: &[(AccountId, Cents, Cents)]) -> HashMap<AccountId, AccountTotals> {
        let mut map: HashMap<AccountId, AccountTotals> = HashMap::new();
        for (id, debit, credit) in entries {
            let totals = map.entry(*id).or_default();
            totals.debit += debit;
            totals.credit += credit;
        }
        map
    }

    #[test]
    fn test_trial_balance_columns() {
        let t = totals(&[
            (1, 100000, 30000),
            (5, 0, 100000),
            (7, 30000, 0),
        ]);

        let tb = build_trial_balance(date("2024-01-31"), &chart(), &t);

        let cash = tb.rows.iter().find(|r| r.name == "Cash").unwrap();
        assert_eq!((cash.debit, cash.credit), (70000, 0));
        let sales = tb.rows.iter().find(|r| r.name == "Sales Revenue").unwrap();
        assert_eq!((sales.debit, sales.credit), (0, 100000));
        assert_eq!(tb.total_debit, 100000);
        assert_eq!(tb.total_credit, 100000);
        assert!(tb.is_balanced());
        // Accounts without activity still appear
        assert_eq!(tb.rows.len(), 7);
    }

    #[test]
    fn test_trial_balance_hides_idle_archived_accounts() {
        let mut accounts = chart();
        accounts[1].archived_at = Some(Utc::now());

        let tb = build_trial_balance(date("2024-01-31"), &accounts, &HashMap::new());
        assert!(tb.rows.iter().all(|r| r.name != "Inventory"));
    }

    #[test]
    fn test_income_statement() {
        let t = totals(&[(5, 0, 250000), (6, 100000, 0), (7, 40000, 0), (1, 110000, 0)]);

        let is = build_income_statement(date("2024-01-01"), date("2024-01-31"), &chart(), &t);

        assert_eq!(is.revenue.total, 250000);
        assert_eq!(is.cost_of_goods_sold.total, 100000);
        assert_eq!(is.expenses.total, 40000);
        assert_eq!(is.gross_profit, 150000);
        assert_eq!(is.net_income, 110000);
        assert_eq!(find(&is.revenue, "Sales Revenue").unwrap().balance, 250000);
    }

    #[test]
    fn test_balance_sheet_includes_current_earnings() {
        // Owner invests 500, buys inventory 300, sells it for 450 cash
        let t = totals(&[
            (1, 50000 + 45000, 30000),
            (4, 0, 50000),
            (2, 30000, 30000),
            (5, 0, 45000),
            (6, 30000, 0),
        ]);

        let bs = build_balance_sheet(date("2024-01-31"), &chart(), &t);

        assert_eq!(bs.assets.total, 65000);
        assert_eq!(bs.liabilities.total, 0);
        assert_eq!(bs.equity.total, 50000);
        assert_eq!(bs.current_earnings, 15000);
        assert_eq!(bs.total_liabilities_and_equity, 65000);
        assert!(bs.is_balanced());
        // Zero balances are left out
        assert!(find(&bs.assets, "Inventory").is_none());
    }

    #[test]
    fn test_net_income_signs() {
        let t = totals(&[(5, 1000, 11000), (6, 4000, 0), (7, 2500, 500)]);
        assert_eq!(net_income(&chart(), &t), 10000 - 4000 - 2000);
    }
}
