use chrono::{DateTime, Utc};
use serde::Serialize;
use tastelist_core::{DraftEntry, FailureKind, ParseAnomaly};

/// Why an entry was not submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Resolution ended in a terminal failure.
    Resolution(FailureKind),
    /// The list store rejected the append.
    Append(String),
    /// The entry never left `Pending` or `NeedsChoice`.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum EntryResult {
    Submitted { candidate_id: String },
    SkippedDueToFailure { reason: SkipReason },
    SkippedDueToLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryOutcome {
    /// Position in the parsed batch.
    pub index: usize,
    pub entry: DraftEntry,
    pub result: EntryResult,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchCounts {
    pub submitted: usize,
    pub failed: usize,
    pub skipped_for_limit: usize,
}

/// Final per-entry report for one bulk-add batch, in input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub list_id: String,
    pub entries: Vec<EntryOutcome>,
    pub counts: BatchCounts,
    /// Segments the parser dropped.
    pub anomalies: Vec<ParseAnomaly>,
    pub completed_at: DateTime<Utc>,
}

impl BatchOutcome {
    pub fn new(list_id: String, entries: Vec<EntryOutcome>, anomalies: Vec<ParseAnomaly>) -> Self {
        let mut counts = BatchCounts::default();
        for outcome in &entries {
            match outcome.result {
                EntryResult::Submitted { .. } => counts.submitted += 1,
                EntryResult::SkippedDueToFailure { .. } => counts.failed += 1,
                EntryResult::SkippedDueToLimit => counts.skipped_for_limit += 1,
            }
        }
        Self {
            list_id,
            entries,
            counts,
            anomalies,
            completed_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Candidate ids submitted, in submission order.
    pub fn submitted_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|o| match &o.result {
            EntryResult::Submitted { candidate_id } => Some(candidate_id.as_str()),
            _ => None,
        })
    }
}
