use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Cents;

pub type AccountId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Cash, bank, receivables, inventory - resources the business controls
    Asset,
    /// Payables, taxes owed, loans
    Liability,
    /// Owner's capital and retained earnings
    Equity,
    /// Sales and other income
    Revenue,
    /// Operating expenses
    Expense,
    /// Cost of goods sold
    Cogs,
}

/// The side on which an account's balance increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalSide {
    Debit,
    Credit,
}

impl AccountType {
    pub const ALL: [AccountType; 6] = [
        AccountType::Asset,
        AccountType::Liability,
        AccountType::Equity,
        AccountType::Revenue,
        AccountType::Expense,
        AccountType::Cogs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
            AccountType::Revenue => "revenue",
            AccountType::Expense => "expense",
            AccountType::Cogs => "cogs",
        }
    }

    pub fn normal_side(&self) -> NormalSide {
        match self {
            AccountType::Asset | AccountType::Expense | AccountType::Cogs => NormalSide::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Revenue => {
                NormalSide::Credit
            }
        }
    }

    /// Revenue, expense and COGS accounts feed the income statement;
    /// the rest are carried on the balance sheet.
    pub fn is_income_statement(&self) -> bool {
        matches!(
            self,
            AccountType::Revenue | AccountType::Expense | AccountType::Cogs
        )
    }
}

impl std::str::FromStr for AccountType {
    type Err = ParseAccountTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asset" => Ok(AccountType::Asset),
            "liability" => Ok(AccountType::Liability),
            "equity" => Ok(AccountType::Equity),
            "revenue" | "income" => Ok(AccountType::Revenue),
            "expense" => Ok(AccountType::Expense),
            "cogs" | "cost_of_goods_sold" | "cost-of-goods-sold" => Ok(AccountType::Cogs),
            _ => Err(ParseAccountTypeError(s.to_string())),
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAccountTypeError(pub String);

impl std::fmt::Display for ParseAccountTypeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown account type '{}' (expected asset, liability, equity, revenue, expense or cogs)",
            self.0
        )
    }
}

impl std::error::Error for ParseAccountTypeError {}

impl NormalSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalSide::Debit => "debit",
            NormalSide::Credit => "credit",
        }
    }

    /// Net effect of a debit/credit pair on a balance kept on this side.
    pub fn signed(&self, debit: Cents, credit: Cents) -> Cents {
        match self {
            NormalSide::Debit => debit - credit,
            NormalSide::Credit => credit - debit,
        }
    }
}

impl std::fmt::Display for NormalSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn normal_side(&self) -> NormalSide {
        self.account_type.normal_side()
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// An account that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub description: Option<String>,
}

impl NewAccount {
    pub fn new(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Chart of accounts installed by `init`.
pub const DEFAULT_CHART: &[(&str, &str, AccountType)] = &[
    ("1000", "Cash on Hand", AccountType::Asset),
    ("1010", "Bank - Current Account", AccountType::Asset),
    ("1100", "Accounts Receivable", AccountType::Asset),
    ("1200", "Inventory", AccountType::Asset),
    ("1500", "Prepaid Expenses", AccountType::Asset),
    ("2000", "Accounts Payable", AccountType::Liability),
    ("2100", "Taxes Payable (VAT/NBT)", AccountType::Liability),
    ("3000", "Owner's Equity", AccountType::Equity),
    ("3100", "Retained Earnings", AccountType::Equity),
    ("4000", "Sales Revenue", AccountType::Revenue),
    ("4100", "Other Income", AccountType::Revenue),
    ("5000", "Cost of Goods Sold", AccountType::Cogs),
    ("5100", "Delivery & Courier Expense", AccountType::Expense),
    ("5200", "Advertising & Marketing", AccountType::Expense),
    ("5300", "Rent Expense", AccountType::Expense),
    ("5400", "Utilities Expense", AccountType::Expense),
    ("5500", "Bank Charges", AccountType::Expense),
];

pub fn default_chart() -> Vec<NewAccount> {
    DEFAULT_CHART
        .iter()
        .map(|(code, name, account_type)| NewAccount::new(*code, *name, *account_type))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_type_roundtrip() {
        for at in AccountType::ALL {
            let parsed: AccountType = at.as_str().parse().unwrap();
            assert_eq!(at, parsed);
        }
    }

    #[test]
    fn test_account_type_aliases() {
        assert_eq!("INCOME".parse::<AccountType>(), Ok(AccountType::Revenue));
        assert_eq!(
            "Cost_Of_Goods_Sold".parse::<AccountType>(),
            Ok(AccountType::Cogs)
        );
        assert_eq!(" Asset ".parse::<AccountType>(), Ok(AccountType::Asset));
    }

    #[test]
    fn test_unknown_account_type() {
        let err = "contra".parse::<AccountType>().unwrap_err();
        assert_eq!(err, ParseAccountTypeError("contra".into()));
    }

    #[test]
    fn test_normal_side_by_type() {
        assert_eq!(AccountType::Asset.normal_side(), NormalSide::Debit);
        assert_eq!(AccountType::Expense.normal_side(), NormalSide::Debit);
        assert_eq!(AccountType::Cogs.normal_side(), NormalSide::Debit);
        assert_eq!(AccountType::Liability.normal_side(), NormalSide::Credit);
        assert_eq!(AccountType::Equity.normal_side(), NormalSide::Credit);
        assert_eq!(AccountType::Revenue.normal_side(), NormalSide::Credit);
    }

    #[test]
    fn test_signed_balance() {
        assert_eq!(NormalSide::Debit.signed(500, 200), 300);
        assert_eq!(NormalSide::Credit.signed(500, 200), -300);
        assert_eq!(NormalSide::Credit.signed(0, 1000), 1000);
    }

    #[test]
    fn test_default_chart_codes_are_unique() {
        let chart = default_chart();
        let mut codes: Vec<_> = chart.iter().map(|a| a.code.as_str()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), chart.len());
        assert!(chart.iter().any(|a| a.account_type == AccountType::Cogs));
    }
}
