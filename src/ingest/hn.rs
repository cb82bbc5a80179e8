// src/ingest/hn.rs
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::ingest::types::{ItemSource, RawItem};

pub const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";

/// Hacker News firebase API client.
pub struct HnClient {
    http: reqwest::Client,
    base_url: String,
}

impl HnClient {
    pub fn new(
        base_url: &str,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .user_agent("hn-insights/0.1 (+github.com/lumlich/hn-insights)")
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::request(base_url, e))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `url` and return the body text of a 2xx response.
    async fn get_text(&self, url: &str) -> Result<String, TransportError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::request(url, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        resp.text()
            .await
            .map_err(|e| TransportError::request(url, e))
    }
}

#[async_trait]
impl ItemSource for HnClient {
    async fn fetch_ranked_ids(&self, limit: usize) -> Result<Vec<u64>, TransportError> {
        let url = format!("{}/topstories.json", self.base_url);
        let body = self.get_text(&url).await?;
        let mut ids: Vec<u64> =
            serde_json::from_str(body.trim()).map_err(|e| TransportError::malformed(&url, e))?;
        ids.truncate(limit);
        tracing::trace!(target: "ingest", count = ids.len(), "ranked ids fetched");
        Ok(ids)
    }

    async fn fetch_item(&self, id: u64) -> Result<RawItem, TransportError> {
        let url = format!("{}/item/{}.json", self.base_url, id);
        let body = self.get_text(&url).await?;
        RawItem::from_body(id, &body).map_err(|e| TransportError::malformed(&url, e))
    }

    fn name(&self) -> &'static str {
        "hacker-news"
    }
}
