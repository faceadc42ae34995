//! HTTP place-search client for the autocomplete/details JSON API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tastelist_core::{Candidate, ResolvedDetails};
use tracing::debug;

use crate::{PlaceSearch, PlacesError};

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DETAILS_FIELDS: &str = "place_id,name,formatted_address";

/// Place provider client. Each call is one HTTP request; retries are the
/// resolver's concern.
pub struct PlacesHttpClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<Prediction>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct Prediction {
    #[serde(rename = "place_id", alias = "candidateId")]
    candidate_id: String,
    description: String,
}

#[derive(Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    result: Option<DetailsResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct DetailsResult {
    #[serde(rename = "place_id", alias = "candidateId")]
    candidate_id: String,
    name: String,
    #[serde(default, rename = "formatted_address", alias = "formattedAddress")]
    formatted_address: String,
}

impl PlacesHttpClient {
    /// `base_url` like `https://maps.googleapis.com/maps/api/place` (no trailing slash needed).
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, PlacesError> {
        let url = format!("{}/{path}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PlacesError::from_status(status.as_u16(), body));
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl PlaceSearch for PlacesHttpClient {
    async fn search(&self, query: &str) -> Result<Vec<Candidate>, PlacesError> {
        debug!(query, "place autocomplete request");
        let resp: SearchResponse = self
            .get_json("autocomplete/json", &[("input", query)])
            .await?;
        let candidates = search_candidates(resp)?;
        debug!(query, count = candidates.len(), "place autocomplete response");
        Ok(candidates)
    }

    async fn details(&self, candidate_id: &str) -> Result<ResolvedDetails, PlacesError> {
        debug!(candidate_id, "place details request");
        let resp: DetailsResponse = self
            .get_json(
                "details/json",
                &[("place_id", candidate_id), ("fields", DETAILS_FIELDS)],
            )
            .await?;
        resolved_details(candidate_id, resp)
    }
}

fn search_candidates(resp: SearchResponse) -> Result<Vec<Candidate>, PlacesError> {
    match resp.status.as_str() {
        "OK" => Ok(resp
            .predictions
            .into_iter()
            .map(|p| Candidate {
                candidate_id: p.candidate_id,
                display_description: p.description,
            })
            .collect()),
        "ZERO_RESULTS" => Ok(Vec::new()),
        other => Err(provider_error(other, resp.error_message, None)),
    }
}

fn resolved_details(candidate_id: &str, resp: DetailsResponse) -> Result<ResolvedDetails, PlacesError> {
    match (resp.status.as_str(), resp.result) {
        ("OK", Some(result)) => Ok(ResolvedDetails {
            candidate_id: result.candidate_id,
            display_name: result.name,
            formatted_address: result.formatted_address,
        }),
        ("OK", None) => Err(PlacesError::Decode(format!(
            "details for {candidate_id} missing result"
        ))),
        (other, _) => Err(provider_error(other, resp.error_message, Some(candidate_id))),
    }
}

/// Map a non-OK provider status to an error.
fn provider_error(status: &str, message: Option<String>, candidate_id: Option<&str>) -> PlacesError {
    let message = message.unwrap_or_else(|| status.to_string());
    match (status, candidate_id) {
        ("OVER_QUERY_LIMIT", _) => PlacesError::RateLimited,
        ("UNKNOWN_ERROR", _) => PlacesError::Unavailable(message),
        ("NOT_FOUND" | "ZERO_RESULTS" | "INVALID_REQUEST", Some(id)) => {
            PlacesError::InvalidCandidate(id.to_string())
        }
        _ => PlacesError::rejected(status, message),
    }
}
