use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{AccountId, Cents};

pub type EntryId = i64;

/// One debit or credit against a single account.
/// Exactly one of `debit` / `credit` is non-zero on a valid line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_id: AccountId,
    pub debit: Cents,
    pub credit: Cents,
    pub description: Option<String>,
}

impl JournalLine {
    pub fn debit(account_id: AccountId, amount: Cents) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: 0,
            description: None,
        }
    }

    pub fn credit(account_id: AccountId, amount: Cents) -> Self {
        Self {
            account_id,
            debit: 0,
            credit: amount,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_debit(&self) -> bool {
        self.debit > 0
    }

    /// The same line on the opposite side.
    pub fn swapped(&self) -> Self {
        Self {
            account_id: self.account_id,
            debit: self.credit,
            credit: self.debit,
            description: self.description.clone(),
        }
    }
}

/// A draft entry, not yet validated or stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJournalEntry {
    pub date: NaiveDate,
    pub memo: String,
    pub lines: Vec<JournalLine>,
    pub reverses: Option<EntryId>,
}

impl NewJournalEntry {
    pub fn new(date: NaiveDate, memo: impl Into<String>) -> Self {
        Self {
            date,
            memo: memo.into(),
            lines: Vec::new(),
            reverses: None,
        }
    }

    pub fn with_line(mut self, line: JournalLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn debit(self, account_id: AccountId, amount: Cents) -> Self {
        self.with_line(JournalLine::debit(account_id, amount))
    }

    pub fn credit(self, account_id: AccountId, amount: Cents) -> Self {
        self.with_line(JournalLine::credit(account_id, amount))
    }
}

/// A posted entry. Posted entries are never edited; corrections are
/// made by posting a reversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    pub date: NaiveDate,
    pub memo: String,
    pub created_at: DateTime<Utc>,
    pub reverses: Option<EntryId>,
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    pub fn is_reversal(&self) -> bool {
        self.reverses.is_some()
    }

    pub fn total_debits(&self) -> Cents {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credits(&self) -> Cents {
        self.lines.iter().map(|l| l.credit).sum()
    }

    /// Build the offsetting entry: every line with debit and credit swapped.
    pub fn create_reversal(&self, date: Option<NaiveDate>, memo: Option<String>) -> NewJournalEntry {
        let memo = memo.unwrap_or_else(|| {
            if self.memo.is_empty() {
                format!("Reversal of #{}", self.id)
            } else {
                format!("Reversal of #{}: {}", self.id, self.memo)
            }
        });

        NewJournalEntry {
            date: date.unwrap_or(self.date),
            memo,
            lines: self.lines.iter().map(JournalLine::swapped).collect(),
            reverses: Some(self.id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Posted,
    Reversed,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Posted => "posted",
            EntryStatus::Reversed => "reversed",
        }
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("a journal entry needs at least 2 lines, got {0}")]
    TooFewLines(usize),

    #[error("line {line}: amounts must not be negative")]
    NegativeAmount { line: usize },

    #[error("line {line}: exactly one of debit or credit must be set")]
    OneSidedLineRequired { line: usize },

    #[error("line {line}: amount overflow")]
    Overflow { line: usize },

    #[error("entry is unbalanced: debits {debits} != credits {credits}")]
    Unbalanced { debits: Cents, credits: Cents },
}

/// Check the double-entry rules on a set of lines.
/// Returns the entry total (debits == credits) when valid.
pub fn validate_lines(lines: &[JournalLine]) -> Result<Cents, EntryError> {
    if lines.len() < 2 {
        return Err(EntryError::TooFewLines(lines.len()));
    }

    let mut debits: Cents = 0;
    let mut credits: Cents = 0;

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        if line.debit < 0 || line.credit < 0 {
            return Err(EntryError::NegativeAmount { line: line_no });
        }
        // Both zero or both set
        if (line.debit == 0) == (line.credit == 0) {
            return Err(EntryError::OneSidedLineRequired { line: line_no });
        }

        debits = debits
            .checked_add(line.debit)
            .ok_or(EntryError::Overflow { line: line_no })?;
        credits = credits
            .checked_add(line.credit)
            .ok_or(EntryError::Overflow { line: line_no })?;
    }

    if debits != credits {
        return Err(EntryError::Unbalanced { debits, credits });
    }

    Ok(debits)
}
