use serde::{Deserialize, Serialize};

use super::{AccountId, Cents, EntryId};

/// Raw facts gathered from storage for an integrity scan.
#[derive(Debug, Clone, Default)]
pub struct IntegrityStats {
    pub account_count: i64,
    pub entry_count: i64,
    pub line_count: i64,
    pub total_debits: Cents,
    pub total_credits: Cents,
    /// (entry, debits, credits)
    pub unbalanced_entries: Vec<(EntryId, Cents, Cents)>,
    /// (entry, line count)
    pub short_entries: Vec<(EntryId, i64)>,
    /// (line, entry)
    pub malformed_lines: Vec<(i64, EntryId)>,
    /// (line, account)
    pub orphan_lines: Vec<(i64, AccountId)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    UnbalancedEntry {
        entry_id: EntryId,
        debits: Cents,
        credits: Cents,
    },
    TooFewLines {
        entry_id: EntryId,
        count: i64,
    },
    MalformedLine {
        line_id: i64,
        entry_id: EntryId,
    },
    UnknownAccount {
        line_id: i64,
        account_id: AccountId,
    },
    TrialBalanceMismatch {
        debits: Cents,
        credits: Cents,
    },
}

impl std::fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntegrityIssue::UnbalancedEntry {
                entry_id,
                debits,
                credits,
            } => write!(
                f,
                "entry #{} is unbalanced (debits {}, credits {})",
                entry_id, debits, credits
            ),
            IntegrityIssue::TooFewLines { entry_id, count } => {
                write!(f, "entry #{} has only {} line(s)", entry_id, count)
            }
            IntegrityIssue::MalformedLine { line_id, entry_id } => write!(
                f,
                "line {} of entry #{} must have exactly one positive side",
                line_id, entry_id
            ),
            IntegrityIssue::UnknownAccount {
                line_id,
                account_id,
            } => write!(
                f,
                "line {} references unknown account {}",
                line_id, account_id
            ),
            IntegrityIssue::TrialBalanceMismatch { debits, credits } => write!(
                f,
                "ledger debits {} do not equal credits {}",
                debits, credits
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub account_count: i64,
    pub entry_count: i64,
    pub line_count: i64,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

pub fn build_integrity_report(stats: IntegrityStats) -> IntegrityReport {
    let mut issues = Vec::new();

    for (entry_id, debits, credits) in stats.unbalanced_entries {
        issues.push(IntegrityIssue::UnbalancedEntry {
            entry_id,
            debits,
            credits,
        });
    }
    for (entry_id, count) in stats.short_entries {
        issues.push(IntegrityIssue::TooFewLines { entry_id, count });
    }
    for (line_id, entry_id) in stats.malformed_lines {
        issues.push(IntegrityIssue::MalformedLine { line_id, entry_id });
    }
    for (line_id, account_id) in stats.orphan_lines {
        issues.push(IntegrityIssue::UnknownAccount {
            line_id,
            account_id,
        });
    }
    if stats.total_debits != stats.total_credits {
        issues.push(IntegrityIssue::TrialBalanceMismatch {
            debits: stats.total_debits,
            credits: stats.total_credits,
        });
    }

    IntegrityReport {
        account_count: stats.account_count,
        entry_count: stats.entry_count,
        line_count: stats.line_count,
        issues,
    }
}
