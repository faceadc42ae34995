//! In-memory place provider and list store for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tastelist_core::{BulkAddConfig, Candidate, DraftEntry, ResolvedDetails};
use tastelist_places::{EntityResolver, PlaceSearch, PlacesError};

use crate::{ListAppend, ListAppendRequest};

/// Searches answer from a query table; unknown queries find one candidate named after the query.
#[derive(Default)]
pub struct FakePlaces {
    results: HashMap<String, Vec<Candidate>>,
    timeouts: HashSet<String>,
    bad_details: HashSet<String>,
    delays: HashMap<String, Duration>,
    search_calls: AtomicU32,
    details_calls: AtomicU32,
    in_flight: AtomicU32,
    max_in_flight: AtomicU32,
}

impl FakePlaces {
    pub fn place(mut self, query: &str, ids: &[&str]) -> Self {
        self.results
            .insert(query.into(), ids.iter().map(|id| candidate(id)).collect());
        self
    }

    pub fn timeout(mut self, query: &str) -> Self {
        self.timeouts.insert(query.into());
        self
    }

    pub fn bad_details(mut self, id: &str) -> Self {
        self.bad_details.insert(id.into());
        self
    }

    pub fn delay(mut self, query: &str, millis: u64) -> Self {
        self.delays
            .insert(query.into(), Duration::from_millis(millis));
        self
    }

    pub fn search_calls(&self) -> u32 {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn details_calls(&self) -> u32 {
        self.details_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> u32 {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlaceSearch for FakePlaces {
    async fn search(&self, query: &str) -> Result<Vec<Candidate>, PlacesError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.timeouts.contains(query) {
            return Err(PlacesError::Timeout);
        }
        Ok(self
            .results
            .get(query)
            .cloned()
            .unwrap_or_else(|| vec![candidate(&id_for(query))]))
    }

    async fn details(&self, candidate_id: &str) -> Result<ResolvedDetails, PlacesError> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        if self.bad_details.contains(candidate_id) {
            return Err(PlacesError::InvalidCandidate(candidate_id.into()));
        }
        Ok(ResolvedDetails {
            candidate_id: candidate_id.into(),
            display_name: format!("Place {candidate_id}"),
            formatted_address: format!("1 {candidate_id} Street"),
        })
    }
}

/// Records appends; fails any item whose candidate id is listed.
#[derive(Default)]
pub struct RecordingList {
    appended: Mutex<Vec<ListAppendRequest>>,
    failing: HashSet<String>,
}

impl RecordingList {
    pub fn failing(mut self, candidate_id: &str) -> Self {
        self.failing.insert(candidate_id.into());
        self
    }

    pub fn appended_ids(&self) -> Vec<String> {
        self.appended
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.source_candidate_id.clone())
            .collect()
    }
}

#[async_trait]
impl ListAppend for RecordingList {
    async fn append(&self, item: &ListAppendRequest) -> anyhow::Result<()> {
        if self.failing.contains(&item.source_candidate_id) {
            anyhow::bail!("list store returned 500 Internal Server Error");
        }
        self.appended.lock().unwrap().push(item.clone());
        Ok(())
    }
}

/// Candidate id the fake derives for an unlisted query.
pub fn id_for(query: &str) -> String {
    query.to_lowercase().replace(' ', "-")
}

pub fn candidate(id: &str) -> Candidate {
    Candidate {
        candidate_id: id.into(),
        display_description: format!("{id}, New York, NY"),
    }
}

pub fn draft(name: &str) -> DraftEntry {
    DraftEntry {
        raw_text: name.into(),
        name: name.into(),
        description_hint: String::new(),
        location_hint: String::new(),
        tags: Default::default(),
    }
}

pub fn config() -> BulkAddConfig {
    BulkAddConfig {
        max_concurrent_resolutions: 4,
        ..Default::default()
    }
}

pub fn resolver(places: FakePlaces) -> EntityResolver<FakePlaces> {
    EntityResolver::new(places, config().retry_policy())
}
