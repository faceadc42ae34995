//! Per-entry resolution state.
//!
//! Transitions:
//!
//! ```text
//! Pending ──► Resolved | NeedsChoice | Failed      (resolver)
//! NeedsChoice ──► Resolved | Failed                (user choice commit)
//! ```
//!
//! `Resolved` and `Failed` are terminal. `Pending` is never re-entered.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entry::{Candidate, ResolvedDetails};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Pending,
    Resolved,
    NeedsChoice,
    Failed,
}

/// Why an entry ended in `Failed`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    #[error("no match found")]
    NotFound,
    #[error("place details unavailable")]
    DetailsUnavailable,
}

/// The payload of a resolution, one variant per status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Resolution {
    Pending,
    Resolved(ResolvedDetails),
    NeedsChoice(Vec<Candidate>),
    Failed(FailureKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionState {
    pub resolution: Resolution,
    /// External calls made for this entry so far, retries included.
    pub attempts: u32,
}

impl Default for ResolutionState {
    fn default() -> Self {
        Self::pending()
    }
}

impl ResolutionState {
    pub fn pending() -> Self {
        Self {
            resolution: Resolution::Pending,
            attempts: 0,
        }
    }

    pub fn resolved(details: ResolvedDetails, attempts: u32) -> Self {
        Self {
            resolution: Resolution::Resolved(details),
            attempts,
        }
    }

    pub fn needs_choice(candidates: Vec<Candidate>, attempts: u32) -> Self {
        Self {
            resolution: Resolution::NeedsChoice(candidates),
            attempts,
        }
    }

    pub fn failed(kind: FailureKind, attempts: u32) -> Self {
        Self {
            resolution: Resolution::Failed(kind),
            attempts,
        }
    }

    pub fn status(&self) -> ResolutionStatus {
        match self.resolution {
            Resolution::Pending => ResolutionStatus::Pending,
            Resolution::Resolved(_) => ResolutionStatus::Resolved,
            Resolution::NeedsChoice(_) => ResolutionStatus::NeedsChoice,
            Resolution::Failed(_) => ResolutionStatus::Failed,
        }
    }

    pub fn candidates(&self) -> Option<&[Candidate]> {
        match &self.resolution {
            Resolution::NeedsChoice(candidates) => Some(candidates),
            _ => None,
        }
    }

    pub fn details(&self) -> Option<&ResolvedDetails> {
        match &self.resolution {
            Resolution::Resolved(details) => Some(details),
            _ => None,
        }
    }

    pub fn last_error(&self) -> Option<FailureKind> {
        match self.resolution {
            Resolution::Failed(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status(),
            ResolutionStatus::Resolved | ResolutionStatus::Failed
        )
    }

    /// Whether the state machine allows moving from this state to `next`.
    pub fn can_transition_to(&self, next: ResolutionStatus) -> bool {
        use ResolutionStatus::*;
        matches!(
            (self.status(), next),
            (Pending, Resolved | NeedsChoice | Failed) | (NeedsChoice, Resolved | Failed)
        )
    }
}
