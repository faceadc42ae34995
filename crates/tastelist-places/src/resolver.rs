//! Entity resolver: turns one draft entry into a resolution state.
//!
//! 1. Search the provider with `name + location`.
//! 2. Zero candidates: `Failed(NotFound)`.
//! 3. One candidate: fetch its details; `Resolved`, or `Failed(DetailsUnavailable)`.
//! 4. Several candidates: `NeedsChoice` with every candidate, in provider order.
//!
//! Both calls go through [`with_retry`]. Nothing is cached; resolving the same
//! entry twice queries the provider twice.

use tastelist_core::{DraftEntry, FailureKind, ResolutionState, RetryPolicy};
use tracing::{debug, warn};

use crate::retry::with_retry;
use crate::{CancelSignal, Cancelled, PlaceSearch};

pub struct EntityResolver<S> {
    places: S,
    policy: RetryPolicy,
}

impl<S: PlaceSearch> EntityResolver<S> {
    pub fn new(places: S, policy: RetryPolicy) -> Self {
        Self { places, policy }
    }

    pub fn places(&self) -> &S {
        &self.places
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Resolve `entry` to completion. Never leaves the state `Pending`.
    pub async fn resolve(&self, entry: &DraftEntry) -> ResolutionState {
        self.resolve_until(entry, &CancelSignal::never())
            .await
            .unwrap_or_default()
    }

    /// Resolve `entry` unless `cancel` fires first.
    pub async fn resolve_until(
        &self,
        entry: &DraftEntry,
        cancel: &CancelSignal,
    ) -> Result<ResolutionState, Cancelled> {
        let query = entry.search_query();
        if query.is_empty() {
            debug!(raw = %entry.raw_text, "entry has no name or location to search");
            return Ok(ResolutionState::failed(FailureKind::NotFound, 0));
        }

        let mut attempts = 0;
        let searched = with_retry(&self.policy, cancel, &mut attempts, "search", || {
            self.places.search(&query)
        })
        .await?;

        let mut candidates = match searched {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(query = %query, attempts, error = %err, "place search failed");
                return Ok(ResolutionState::failed(FailureKind::NotFound, attempts));
            }
        };

        match candidates.len() {
            0 => {
                debug!(query = %query, "no place candidates");
                Ok(ResolutionState::failed(FailureKind::NotFound, attempts))
            }
            1 => {
                let candidate = candidates.remove(0);
                self.fetch_details(&candidate.candidate_id, attempts, cancel)
                    .await
            }
            n => {
                debug!(query = %query, candidates = n, "entry needs a choice");
                Ok(ResolutionState::needs_choice(candidates, attempts))
            }
        }
    }

    /// Fetch details for `candidate_id`, continuing an entry's attempt count.
    ///
    /// Used for single-candidate searches and for committing a user's choice.
    pub async fn fetch_details(
        &self,
        candidate_id: &str,
        prior_attempts: u32,
        cancel: &CancelSignal,
    ) -> Result<ResolutionState, Cancelled> {
        let mut attempts = prior_attempts;
        let fetched = with_retry(&self.policy, cancel, &mut attempts, "details", || {
            self.places.details(candidate_id)
        })
        .await?;

        match fetched {
            Ok(details) => Ok(ResolutionState::resolved(details, attempts)),
            Err(err) => {
                warn!(candidate_id, attempts, error = %err, "place details unavailable");
                Ok(ResolutionState::failed(
                    FailureKind::DetailsUnavailable,
                    attempts,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PlacesError, cancel_pair};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tastelist_core::{Candidate, Resolution, ResolutionStatus, ResolvedDetails};

    /// Plays back queued responses; falls back to "nothing found".
    #[derive(Default)]
    struct ScriptedPlaces {
        searches: Mutex<VecDeque<Result<Vec<Candidate>, PlacesError>>>,
        details: Mutex<VecDeque<Result<ResolvedDetails, PlacesError>>>,
        always_fail_search: Option<PlacesError>,
        search_calls: AtomicU32,
        details_calls: AtomicU32,
    }

    impl ScriptedPlaces {
        fn with_search(self, result: Result<Vec<Candidate>, PlacesError>) -> Self {
            self.searches.lock().unwrap().push_back(result);
            self
        }

        fn with_details(self, result: Result<ResolvedDetails, PlacesError>) -> Self {
            self.details.lock().unwrap().push_back(result);
            self
        }

        fn searches(&self) -> u32 {
            self.search_calls.load(Ordering::SeqCst)
        }

        fn detail_calls(&self) -> u32 {
            self.details_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PlaceSearch for ScriptedPlaces {
        async fn search(&self, _query: &str) -> Result<Vec<Candidate>, PlacesError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = &self.always_fail_search {
                return Err(err.clone());
            }
            self.searches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Vec::new()))
        }

        async fn details(&self, candidate_id: &str) -> Result<ResolvedDetails, PlacesError> {
            self.details_calls.fetch_add(1, Ordering::SeqCst);
            self.details
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(PlacesError::InvalidCandidate(candidate_id.into())))
        }
    }

    fn candidate(id: &str) -> Candidate {
        Candidate {
            candidate_id: id.into(),
            display_description: format!("{id}, New York, NY"),
        }
    }

    fn details(id: &str) -> ResolvedDetails {
        ResolvedDetails {
            candidate_id: id.into(),
            display_name: "Joe's Pizza".into(),
            formatted_address: "7 Carmine St, New York, NY".into(),
        }
    }

    fn entry(name: &str, location: &str) -> DraftEntry {
        DraftEntry {
            raw_text: format!("{name}, , {location}"),
            name: name.into(),
            description_hint: String::new(),
            location_hint: location.into(),
            tags: Default::default(),
        }
    }

    fn resolver(places: ScriptedPlaces) -> EntityResolver<ScriptedPlaces> {
        EntityResolver::new(
            places,
            RetryPolicy {
                max_attempts: 3,
                delay: Duration::from_millis(1000),
            },
        )
    }

    #[tokio::test]
    async fn single_candidate_resolves_without_interaction() {
        let r = resolver(
            ScriptedPlaces::default()
                .with_search(Ok(vec![candidate("c1")]))
                .with_details(Ok(details("c1"))),
        );
        let state = r.resolve(&entry("Joe's Pizza", "NYC")).await;
        assert_eq!(state.status(), ResolutionStatus::Resolved);
        assert_eq!(state.details(), Some(&details("c1")));
        assert_eq!(state.attempts, 2);
    }

    #[tokio::test]
    async fn zero_candidates_is_not_found() {
        let r = resolver(ScriptedPlaces::default().with_search(Ok(vec![])));
        let state = r.resolve(&entry("Nowhere Diner", "Atlantis")).await;
        assert_eq!(state.last_error(), Some(FailureKind::NotFound));
        assert_eq!(state.attempts, 1);
        assert_eq!(r.places().detail_calls(), 0);
    }

    #[tokio::test]
    async fn many_candidates_need_a_choice() {
        let found: Vec<Candidate> = (1..=7).map(|i| candidate(&format!("c{i}"))).collect();
        let r = resolver(ScriptedPlaces::default().with_search(Ok(found.clone())));
        let state = r.resolve(&entry("Joe's", "")).await;
        assert_eq!(state.resolution, Resolution::NeedsChoice(found));
        assert_eq!(r.places().detail_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn search_that_always_times_out_fails_after_three_attempts() {
        let r = resolver(ScriptedPlaces {
            always_fail_search: Some(PlacesError::Timeout),
            ..Default::default()
        });
        let state = r.resolve(&entry("Joe's Pizza", "NYC")).await;
        assert_eq!(state.last_error(), Some(FailureKind::NotFound));
        assert_eq!(state.attempts, 3);
        assert_eq!(r.places().searches(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_search_failure_recovers() {
        let r = resolver(
            ScriptedPlaces::default()
                .with_search(Err(PlacesError::Server {
                    status: 502,
                    body: "bad gateway".into(),
                }))
                .with_search(Ok(vec![candidate("c1")]))
                .with_details(Ok(details("c1"))),
        );
        let state = r.resolve(&entry("Joe's Pizza", "NYC")).await;
        assert_eq!(state.status(), ResolutionStatus::Resolved);
        assert_eq!(state.attempts, 3);
    }

    #[tokio::test]
    async fn rejected_search_is_not_retried() {
        let r = resolver(
            ScriptedPlaces::default().with_search(Err(PlacesError::rejected(400, "bad"))),
        );
        let state = r.resolve(&entry("Joe's Pizza", "NYC")).await;
        assert_eq!(state.last_error(), Some(FailureKind::NotFound));
        assert_eq!(r.places().searches(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn details_exhausting_retries_is_details_unavailable() {
        let r = resolver(
            ScriptedPlaces::default()
                .with_search(Ok(vec![candidate("c1")]))
                .with_details(Err(PlacesError::Timeout))
                .with_details(Err(PlacesError::Timeout))
                .with_details(Err(PlacesError::Timeout))
                .with_details(Ok(details("c1"))),
        );
        let state = r.resolve(&entry("Joe's Pizza", "NYC")).await;
        assert_eq!(state.last_error(), Some(FailureKind::DetailsUnavailable));
        assert_eq!(r.places().detail_calls(), 3);
        assert_eq!(state.attempts, 4);
    }

    #[tokio::test]
    async fn invalid_candidate_details_not_retried() {
        let r = resolver(ScriptedPlaces::default().with_search(Ok(vec![candidate("gone")])));
        let state = r.resolve(&entry("Joe's Pizza", "NYC")).await;
        assert_eq!(state.last_error(), Some(FailureKind::DetailsUnavailable));
        assert_eq!(r.places().detail_calls(), 1);
    }

    #[tokio::test]
    async fn empty_query_makes_no_calls() {
        let r = resolver(ScriptedPlaces::default());
        let mut e = entry("", "");
        e.description_hint = "great noodles".into();
        let state = r.resolve(&e).await;
        assert_eq!(state.last_error(), Some(FailureKind::NotFound));
        assert_eq!(r.places().searches(), 0);
    }

    #[tokio::test]
    async fn re_resolving_queries_again() {
        let r = resolver(
            ScriptedPlaces::default()
                .with_search(Ok(vec![]))
                .with_search(Ok(vec![])),
        );
        let e = entry("Joe's Pizza", "NYC");
        r.resolve(&e).await;
        r.resolve(&e).await;
        assert_eq!(r.places().searches(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_abandons_retry_sleep() {
        let r = resolver(ScriptedPlaces {
            always_fail_search: Some(PlacesError::Timeout),
            ..Default::default()
        });
        let (handle, signal) = cancel_pair();
        let e = entry("Joe's Pizza", "NYC");
        let (result, ()) = tokio::join!(r.resolve_until(&e, &signal), async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            handle.cancel();
        });
        assert_eq!(result, Err(Cancelled));
        assert_eq!(r.places().searches(), 1);
    }
}
