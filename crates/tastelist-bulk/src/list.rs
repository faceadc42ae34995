//! List-append collaborator: one call per submitted item, no batch endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tastelist_core::{DraftEntry, ResolvedDetails};

/// One item appended to a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAppendRequest {
    pub list_id: String,
    pub name: String,
    pub description: String,
    pub location: String,
    pub source_candidate_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ListAppendRequest {
    /// Build the item for a resolved entry. The provider's name wins over the typed one.
    pub fn new(list_id: &str, entry: &DraftEntry, details: &ResolvedDetails) -> Self {
        let name = if details.display_name.trim().is_empty() {
            entry.name.clone()
        } else {
            details.display_name.clone()
        };
        Self {
            list_id: list_id.to_string(),
            name,
            description: entry.description_hint.clone(),
            location: details.formatted_address.clone(),
            source_candidate_id: details.candidate_id.clone(),
            tags: entry.tags.iter().cloned().collect(),
        }
    }
}

/// Append-only list store. Ordering and atomicity of each append belong to the store.
#[async_trait]
pub trait ListAppend: Send + Sync {
    async fn append(&self, item: &ListAppendRequest) -> anyhow::Result<()>;
}

#[async_trait]
impl<T: ListAppend + ?Sized> ListAppend for Arc<T> {
    async fn append(&self, item: &ListAppendRequest) -> anyhow::Result<()> {
        (**self).append(item).await
    }
}

#[cfg(feature = "http")]
mod http {
    use anyhow::Context;
    use async_trait::async_trait;
    use tracing::info;

    use super::{ListAppend, ListAppendRequest};

    /// HTTP client for the list store's item endpoint.
    pub struct ListHttpClient {
        client: reqwest::Client,
        base_url: String,
    }

    impl ListHttpClient {
        /// `base_url` should be like `http://localhost:3000` (no trailing slash).
        pub fn new(base_url: String) -> Self {
            Self {
                client: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
            }
        }

        fn items_url(&self, list_id: &str) -> String {
            format!("{}/api/lists/{list_id}/items", self.base_url)
        }
    }

    #[async_trait]
    impl ListAppend for ListHttpClient {
        async fn append(&self, item: &ListAppendRequest) -> anyhow::Result<()> {
            let url = self.items_url(&item.list_id);
            info!(url = %url, candidate = %item.source_candidate_id, "appending list item");
            let resp = self
                .client
                .post(&url)
                .json(item)
                .send()
                .await
                .with_context(|| format!("POST {url}"))?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("list store returned {status}: {body}");
            }
            Ok(())
        }
    }

}

#[cfg(feature = "http")]
pub use http::ListHttpClient;
