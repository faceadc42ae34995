//! Bulk add: resolve a pasted batch of restaurants, collect user choices, submit to a list.

mod list;
mod orchestrator;
mod outcome;
mod tracker;

#[cfg(test)]
mod testing;

pub use list::{ListAppend, ListAppendRequest};
pub use orchestrator::{BatchProgress, BulkAdd, ListTarget, PendingBatch};
pub use outcome::{BatchCounts, BatchOutcome, EntryOutcome, EntryResult, SkipReason};
pub use tracker::{ChoiceError, DisambiguationTracker, StatusCounts, TransitionError};

#[cfg(feature = "http")]
pub use list::ListHttpClient;
