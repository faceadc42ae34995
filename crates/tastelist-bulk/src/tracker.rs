//! Disambiguation tracker: the resolution state of every entry in a batch.
//!
//! Entries are addressed by their position in the parsed batch. The resolver
//! drives `Pending` entries forward; [`commit_choice`](DisambiguationTracker::commit_choice)
//! settles `NeedsChoice` entries. Every transition publishes a fresh snapshot
//! to receivers from [`subscribe`](DisambiguationTracker::subscribe).

use serde::Serialize;
use tastelist_core::{DraftEntry, ResolutionState, ResolutionStatus};
use tastelist_places::{CancelSignal, Cancelled, EntityResolver, PlaceSearch};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

/// A rejected [`commit_choice`](DisambiguationTracker::commit_choice). The entry is unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChoiceError {
    #[error("no entry at index {0}")]
    UnknownEntry(usize),

    #[error("entry {index} is {status:?}, not awaiting a choice")]
    NotAwaitingChoice {
        index: usize,
        status: ResolutionStatus,
    },

    #[error("candidate {candidate_id} was not offered for entry {index}")]
    UnknownCandidate { index: usize, candidate_id: String },

    #[error("choice commit cancelled")]
    Cancelled(#[from] Cancelled),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("no entry at index {0}")]
    UnknownEntry(usize),

    #[error("entry {index} cannot move from {from:?} to {to:?}")]
    Illegal {
        index: usize,
        from: ResolutionStatus,
        to: ResolutionStatus,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub resolved: usize,
    pub needs_choice: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct DisambiguationTracker {
    entries: Vec<DraftEntry>,
    states: Vec<ResolutionState>,
    updates: watch::Sender<Vec<ResolutionState>>,
}

impl DisambiguationTracker {
    /// Track `entries`, all starting `Pending`.
    pub fn new(entries: Vec<DraftEntry>) -> Self {
        let states = vec![ResolutionState::pending(); entries.len()];
        let (updates, _) = watch::channel(states.clone());
        Self {
            entries,
            states,
            updates,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DraftEntry] {
        &self.entries
    }

    pub fn states(&self) -> &[ResolutionState] {
        &self.states
    }

    pub fn state(&self, index: usize) -> Option<&ResolutionState> {
        self.states.get(index)
    }

    /// Receive a snapshot of every state after each transition.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ResolutionState>> {
        self.updates.subscribe()
    }

    /// Entries still waiting for a user choice.
    pub fn needs_choice(&self) -> Vec<usize> {
        self.indices_with(ResolutionStatus::NeedsChoice)
    }

    /// Entries that ended in a terminal failure.
    pub fn failed(&self) -> Vec<usize> {
        self.indices_with(ResolutionStatus::Failed)
    }

    /// Entries the resolver has not finished with.
    pub fn pending(&self) -> Vec<usize> {
        self.indices_with(ResolutionStatus::Pending)
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for state in &self.states {
            match state.status() {
                ResolutionStatus::Pending => counts.pending += 1,
                ResolutionStatus::Resolved => counts.resolved += 1,
                ResolutionStatus::NeedsChoice => counts.needs_choice += 1,
                ResolutionStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    fn indices_with(&self, status: ResolutionStatus) -> Vec<usize> {
        self.states
            .iter()
            .enumerate()
            .filter(|(_, s)| s.status() == status)
            .map(|(i, _)| i)
            .collect()
    }

    /// Record a state produced by the resolver.
    pub(crate) fn record(
        &mut self,
        index: usize,
        next: ResolutionState,
    ) -> Result<(), TransitionError> {
        let current = self
            .states
            .get(index)
            .ok_or(TransitionError::UnknownEntry(index))?;
        if !current.can_transition_to(next.status()) {
            return Err(TransitionError::Illegal {
                index,
                from: current.status(),
                to: next.status(),
            });
        }
        debug!(index, status = ?next.status(), attempts = next.attempts, "entry state changed");
        self.states[index] = next;
        self.updates.send_replace(self.states.clone());
        Ok(())
    }

    /// Commit the user's pick for a `NeedsChoice` entry and fetch its details.
    ///
    /// Ends `Resolved` or `Failed`. Any error leaves the entry untouched.
    pub async fn commit_choice<S: PlaceSearch>(
        &mut self,
        resolver: &EntityResolver<S>,
        index: usize,
        candidate_id: &str,
        cancel: &CancelSignal,
    ) -> Result<&ResolutionState, ChoiceError> {
        let current = self
            .states
            .get(index)
            .ok_or(ChoiceError::UnknownEntry(index))?;
        let Some(candidates) = current.candidates() else {
            return Err(ChoiceError::NotAwaitingChoice {
                index,
                status: current.status(),
            });
        };
        if !candidates.iter().any(|c| c.candidate_id == candidate_id) {
            return Err(ChoiceError::UnknownCandidate {
                index,
                candidate_id: candidate_id.to_string(),
            });
        }

        let next = resolver
            .fetch_details(candidate_id, current.attempts, cancel)
            .await?;
        info!(index, candidate_id, status = ?next.status(), "choice committed");
        self.record(index, next).map_err(|_| ChoiceError::NotAwaitingChoice {
            index,
            status: self.states[index].status(),
        })?;
        Ok(&self.states[index])
    }
}
