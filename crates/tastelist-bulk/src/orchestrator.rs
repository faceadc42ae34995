//! Bulk submission orchestrator.
//!
//! A batch goes through four phases:
//!
//! 1. Parse the pasted text into draft entries.
//! 2. Resolve every `Pending` entry, at most `max_concurrent_resolutions` at a time.
//! 3. Stop while any entry needs a user choice; the caller commits choices and resumes.
//! 4. Submit resolved entries in input order, up to the list's remaining capacity.
//!
//! Resolution tasks finish in any order, but each writes only its own entry
//! and the outcome is assembled by index, so results always follow the input.

use futures::StreamExt;
use futures::stream;
use tastelist_core::{
    BulkAddConfig, DraftEntry, ParseAnomaly, Resolution, ResolutionState, parse_report,
};
use tastelist_places::{CancelSignal, EntityResolver, PlaceSearch};
use tracing::{debug, info, warn};

use crate::list::{ListAppend, ListAppendRequest};
use crate::outcome::{BatchOutcome, EntryOutcome, EntryResult, SkipReason};
use crate::tracker::{ChoiceError, DisambiguationTracker};

/// The list a batch is appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListTarget {
    pub list_id: String,
    /// Items already on the list before this batch.
    pub existing_item_count: usize,
}

impl ListTarget {
    pub fn new(list_id: impl Into<String>, existing_item_count: usize) -> Self {
        Self {
            list_id: list_id.into(),
            existing_item_count,
        }
    }
}

/// A parsed batch that has not been submitted yet.
#[derive(Debug)]
pub struct PendingBatch {
    target: ListTarget,
    tracker: DisambiguationTracker,
    anomalies: Vec<ParseAnomaly>,
}

impl PendingBatch {
    pub fn target(&self) -> &ListTarget {
        &self.target
    }

    pub fn tracker(&self) -> &DisambiguationTracker {
        &self.tracker
    }

    pub fn entries(&self) -> &[DraftEntry] {
        self.tracker.entries()
    }

    pub fn state(&self, index: usize) -> Option<&ResolutionState> {
        self.tracker.state(index)
    }

    /// Entries the caller must choose a candidate for before the batch can finish.
    pub fn needs_choice(&self) -> Vec<usize> {
        self.tracker.needs_choice()
    }

    pub fn anomalies(&self) -> &[ParseAnomaly] {
        &self.anomalies
    }
}

#[derive(Debug)]
pub enum BatchProgress {
    /// Submission finished; nothing further to do.
    Completed(BatchOutcome),
    /// At least one entry needs a user choice. Commit choices, then resume.
    AwaitingChoices(PendingBatch),
    /// Cancelled before submission. Finished resolutions are kept; resume to continue.
    Cancelled(PendingBatch),
}

pub struct BulkAdd<S, L> {
    resolver: EntityResolver<S>,
    list: L,
    config: BulkAddConfig,
}

impl<S: PlaceSearch, L: ListAppend> BulkAdd<S, L> {
    pub fn new(places: S, list: L, config: BulkAddConfig) -> Self {
        Self {
            resolver: EntityResolver::new(places, config.retry_policy()),
            list,
            config,
        }
    }

    pub fn resolver(&self) -> &EntityResolver<S> {
        &self.resolver
    }

    pub fn list(&self) -> &L {
        &self.list
    }

    pub fn config(&self) -> &BulkAddConfig {
        &self.config
    }

    /// Parse `raw_input` into a batch without contacting the provider.
    ///
    /// Callers that want live snapshots subscribe to the batch's tracker
    /// before handing it to [`resume`](Self::resume).
    pub fn prepare(&self, raw_input: &str, target: ListTarget) -> PendingBatch {
        let report = parse_report(raw_input, &self.config.field_order);
        debug!(
            entries = report.entries.len(),
            anomalies = report.anomalies.len(),
            "parsed bulk-add input"
        );
        PendingBatch {
            target,
            tracker: DisambiguationTracker::new(report.entries),
            anomalies: report.anomalies,
        }
    }

    pub async fn run(&self, raw_input: &str, target: ListTarget) -> BatchProgress {
        self.run_until(raw_input, target, &CancelSignal::never())
            .await
    }

    /// Parse, resolve, and submit unless a choice is needed or `cancel` fires.
    pub async fn run_until(
        &self,
        raw_input: &str,
        target: ListTarget,
        cancel: &CancelSignal,
    ) -> BatchProgress {
        let batch = self.prepare(raw_input, target);
        self.resume(batch, cancel).await
    }

    /// Settle a `NeedsChoice` entry of `batch` with the user's pick.
    pub async fn commit_choice<'b>(
        &self,
        batch: &'b mut PendingBatch,
        index: usize,
        candidate_id: &str,
        cancel: &CancelSignal,
    ) -> Result<&'b ResolutionState, ChoiceError> {
        batch
            .tracker
            .commit_choice(&self.resolver, index, candidate_id, cancel)
            .await
    }

    /// Continue a batch: resolve what is still pending, then submit once no choices remain.
    pub async fn resume(&self, mut batch: PendingBatch, cancel: &CancelSignal) -> BatchProgress {
        if batch.tracker.is_empty() {
            info!(list_id = %batch.target.list_id, "empty bulk-add batch");
            return BatchProgress::Completed(BatchOutcome::new(
                batch.target.list_id,
                Vec::new(),
                batch.anomalies,
            ));
        }

        self.resolve_pending(&mut batch.tracker, cancel).await;

        let counts = batch.tracker.counts();
        info!(
            pending = counts.pending,
            resolved = counts.resolved,
            needs_choice = counts.needs_choice,
            failed = counts.failed,
            "bulk-add resolution finished"
        );

        if cancel.is_cancelled() || counts.pending > 0 {
            info!(list_id = %batch.target.list_id, pending = counts.pending, "bulk-add batch cancelled");
            return BatchProgress::Cancelled(batch);
        }
        if counts.needs_choice > 0 {
            return BatchProgress::AwaitingChoices(batch);
        }
        BatchProgress::Completed(self.submit(batch).await)
    }

    async fn resolve_pending(&self, tracker: &mut DisambiguationTracker, cancel: &CancelSignal) {
        let pending: Vec<(usize, DraftEntry)> = tracker
            .pending()
            .into_iter()
            .map(|index| (index, tracker.entries()[index].clone()))
            .collect();
        if pending.is_empty() {
            return;
        }

        let concurrency = self.config.concurrency();
        info!(entries = pending.len(), concurrency, "resolving bulk-add entries");

        let resolver = &self.resolver;
        let mut resolved = stream::iter(pending)
            .map(|(index, entry)| async move {
                (index, resolver.resolve_until(&entry, cancel).await)
            })
            .buffer_unordered(concurrency);

        while let Some((index, result)) = resolved.next().await {
            match result {
                Ok(state) => {
                    if let Err(err) = tracker.record(index, state) {
                        warn!(index, error = %err, "discarding resolution");
                    }
                }
                Err(_) => debug!(index, "resolution cancelled"),
            }
        }
    }

    async fn submit(&self, batch: PendingBatch) -> BatchOutcome {
        let PendingBatch {
            target,
            tracker,
            anomalies,
        } = batch;

        let capacity = self
            .config
            .max_items_per_list
            .saturating_sub(target.existing_item_count);
        let mut slots_used = 0;
        let mut outcomes = Vec::with_capacity(tracker.len());

        for (index, (entry, state)) in tracker.entries().iter().zip(tracker.states()).enumerate() {
            let result = match &state.resolution {
                Resolution::Resolved(_) if slots_used >= capacity => EntryResult::SkippedDueToLimit,
                Resolution::Resolved(details) => {
                    slots_used += 1;
                    let item = ListAppendRequest::new(&target.list_id, entry, details);
                    match self.list.append(&item).await {
                        Ok(()) => EntryResult::Submitted {
                            candidate_id: details.candidate_id.clone(),
                        },
                        Err(err) => {
                            let reason = format!("{err:#}");
                            warn!(index, candidate_id = %details.candidate_id, error = %reason, "list append failed");
                            EntryResult::SkippedDueToFailure {
                                reason: SkipReason::Append(reason),
                            }
                        }
                    }
                }
                Resolution::Failed(kind) => EntryResult::SkippedDueToFailure {
                    reason: SkipReason::Resolution(*kind),
                },
                Resolution::Pending | Resolution::NeedsChoice(_) => {
                    EntryResult::SkippedDueToFailure {
                        reason: SkipReason::Unresolved,
                    }
                }
            };
            outcomes.push(EntryOutcome {
                index,
                entry: entry.clone(),
                result,
            });
        }

        let outcome = BatchOutcome::new(target.list_id, outcomes, anomalies);
        info!(
            list_id = %outcome.list_id,
            submitted = outcome.counts.submitted,
            failed = outcome.counts.failed,
            skipped_for_limit = outcome.counts.skipped_for_limit,
            "bulk-add batch submitted"
        );
        outcome
    }
}
