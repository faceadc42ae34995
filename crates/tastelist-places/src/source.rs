use std::sync::Arc;

use async_trait::async_trait;
use tastelist_core::{Candidate, ResolvedDetails};

use crate::PlacesError;

/// External place-search provider.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    /// Candidates in provider order. An empty list means the provider found nothing.
    async fn search(&self, query: &str) -> Result<Vec<Candidate>, PlacesError>;

    /// Full record for one candidate returned by [`search`](Self::search).
    async fn details(&self, candidate_id: &str) -> Result<ResolvedDetails, PlacesError>;
}

#[async_trait]
impl<T: PlaceSearch + ?Sized> PlaceSearch for Arc<T> {
    async fn search(&self, query: &str) -> Result<Vec<Candidate>, PlacesError> {
        (**self).search(query).await
    }

    async fn details(&self, candidate_id: &str) -> Result<ResolvedDetails, PlacesError> {
        (**self).details(candidate_id).await
    }
}
