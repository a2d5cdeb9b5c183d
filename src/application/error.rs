use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{Cents, EntryError, EntryId};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid account type: {0}")]
    InvalidAccountType(String),

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    #[error("Account is archived: {0}")]
    AccountArchived(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unbalanced entry: debits {debits} != credits {credits}")]
    UnbalancedEntry { debits: Cents, credits: Cents },

    #[error("A journal entry needs at least 2 lines, got {0}")]
    TooFewLines(usize),

    #[error("Journal entry not found: #{0}")]
    EntryNotFound(EntryId),

    #[error("Journal entry #{original} was already reversed by #{reversal}")]
    AlreadyReversed { original: EntryId, reversal: EntryId },

    #[error("Journal entry #{0} is itself a reversal")]
    CannotReverseReversal(EntryId),

    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange { from: NaiveDate, to: NaiveDate },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Ledger invariants do not hold. Signals a bug or corrupted data,
    /// never bad user input.
    #[error("Ledger integrity violation: {0}")]
    LedgerIntegrity(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    /// True for errors caused by the caller's input; these are reported
    /// back as-is and never retried.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, AppError::LedgerIntegrity(_) | AppError::Database(_))
    }
}

impl From<EntryError> for AppError {
    fn from(err: EntryError) -> Self {
        match err {
            EntryError::TooFewLines(n) => AppError::TooFewLines(n),
            EntryError::Unbalanced { debits, credits } => {
                AppError::UnbalancedEntry { debits, credits }
            }
            other @ (EntryError::NegativeAmount { .. }
            | EntryError::OneSidedLineRequired { .. }
            | EntryError::Overflow { .. }) => AppError::InvalidAmount(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_errors_map_to_app_errors() {
        assert!(matches!(
            AppError::from(EntryError::Unbalanced {
                debits: 10000,
                credits: 9000
            }),
            AppError::UnbalancedEntry {
                debits: 10000,
                credits: 9000
            }
        ));
        assert!(matches!(
            AppError::from(EntryError::OneSidedLineRequired { line: 2 }),
            AppError::InvalidAmount(msg) if msg.contains("line 2")
        ));
        assert!(matches!(
            AppError::from(EntryError::TooFewLines(1)),
            AppError::TooFewLines(1)
        ));
    }

    #[test]
    fn test_user_error_classification() {
        assert!(AppError::UnknownAccount("9999".into()).is_user_error());
        assert!(!AppError::LedgerIntegrity("totals differ".into()).is_user_error());
        assert!(!AppError::Database(anyhow::anyhow!("disk full")).is_user_error());
    }
}
