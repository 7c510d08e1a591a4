//! Audiobookshelf HTTP client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, error, warn};

use super::wire::{ItemsResponse, LibrariesResponse};
use super::{CatalogApi, DeleteOutcome};
use crate::models::{CatalogItem, Library, TagUpdate};
use crate::time::millis_to_duration;
use crate::{Error, Result};

const USER_AGENT: &str = concat!("bookdupes/", env!("CARGO_PKG_VERSION"));

/// Items per batch tag update request
pub const BATCH_SIZE: usize = 100;

/// Pause between consecutive batch requests
pub const BATCH_PACING_MS: u64 = 30;

const LIST_LIBRARIES_TIMEOUT: Duration = Duration::from_secs(30);
const LIST_ITEMS_TIMEOUT: Duration = Duration::from_secs(120);
const BATCH_UPDATE_TIMEOUT: Duration = Duration::from_secs(60);
const DELETE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchUpdateEntry<'a> {
    id: &'a str,
    media_payload: MediaPayload<'a>,
}

#[derive(Serialize)]
struct MediaPayload<'a> {
    tags: &'a [String],
}

/// Audiobookshelf API client
#[derive(Debug, Clone)]
pub struct AbsClient {
    base_url: String,
    token: String,
    http_client: reqwest::Client,
    batch_size: usize,
    pacing: Duration,
}

/// Builder for [`AbsClient`]
#[derive(Debug, Default)]
pub struct AbsClientBuilder {
    base_url: Option<String>,
    token: Option<String>,
    insecure: bool,
    batch_size: Option<usize>,
}

impl AbsClientBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Skip TLS certificate verification
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size.max(1));
        self
    }

    pub fn build(self) -> Result<AbsClient> {
        let base_url = self
            .base_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::Config("catalog base_url is not set".to_string()))?;
        let token = self
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Config("catalog token is not set".to_string()))?;

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(self.insecure)
            .build()?;

        Ok(AbsClient {
            base_url,
            token,
            http_client,
            batch_size: self.batch_size.unwrap_or(BATCH_SIZE),
            pacing: millis_to_duration(BATCH_PACING_MS),
        })
    }
}

impl AbsClient {
    pub fn builder() -> AbsClientBuilder {
        AbsClientBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/{}", self.base_url, endpoint)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }

    async fn error_from(response: Response) -> Error {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error body".to_string());
        Error::Api { status, message }
    }

    async fn send_batch(&self, chunk: &[TagUpdate]) -> Result<u64> {
        let payload: Vec<BatchUpdateEntry<'_>> = chunk
            .iter()
            .map(|u| BatchUpdateEntry {
                id: &u.id,
                media_payload: MediaPayload { tags: &u.tags },
            })
            .collect();

        let url = self.url("items/batch/update");
        debug!(url = %url, count = chunk.len(), "Sending batch tag update");

        let response = self
            .authorized(self.http_client.post(&url))
            .timeout(BATCH_UPDATE_TIMEOUT)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::error_from(response).await;
            error!("Batch update failed: {}", err);
            return Err(err);
        }

        // Count is advisory: an unreadable body is not a failure
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        Ok(body.get("updates").and_then(|v| v.as_u64()).unwrap_or(0))
    }
}

#[async_trait]
impl CatalogApi for AbsClient {
    async fn list_libraries(&self) -> Result<Vec<Library>> {
        let url = self.url("libraries");
        debug!(url = %url, "Listing libraries");

        let response = self
            .authorized(self.http_client.get(&url))
            .timeout(LIST_LIBRARIES_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let text = response.text().await?;
        let parsed: LibrariesResponse = serde_json::from_str(&text)?;
        Ok(parsed.into_libraries())
    }

    async fn list_items(&self, library_id: &str) -> Result<Vec<CatalogItem>> {
        let url = self.url(&format!("libraries/{}/items", library_id));
        debug!(url = %url, "Listing library items");

        let response = self
            .authorized(self.http_client.get(&url))
            .query(&[("expanded", "1")])
            .timeout(LIST_ITEMS_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let text = response.text().await?;
        let parsed: ItemsResponse = serde_json::from_str(&text)?;
        Ok(parsed.into_book_items())
    }

    async fn batch_update_tags(&self, updates: &[TagUpdate]) -> Result<u64> {
        let mut total = 0;
        for (index, chunk) in updates.chunks(self.batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pacing).await;
            }
            total += self.send_batch(chunk).await?;
        }
        Ok(total)
    }

    async fn delete_item(&self, item_id: &str) -> Result<DeleteOutcome> {
        let url = self.url(&format!("items/{}", item_id));
        debug!(url = %url, "Deleting catalog item");

        let response = self
            .authorized(self.http_client.delete(&url))
            .timeout(DELETE_TIMEOUT)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(DeleteOutcome::Deleted),
            StatusCode::NOT_FOUND => {
                warn!("Item {} already absent in catalog", item_id);
                Ok(DeleteOutcome::AlreadyAbsent)
            }
            status if status.is_success() => Ok(DeleteOutcome::Deleted),
            _ => Err(Self::error_from(response).await),
        }
    }
}
