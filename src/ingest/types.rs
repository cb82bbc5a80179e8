// src/ingest/types.rs
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// One ranked item as delivered by the upstream API, with defaults applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawItem {
    pub id: u64,
    pub title: String,
    pub url: Option<String>,
    pub time: i64, // unix seconds, 0 when unset
    pub score: u64,
    pub descendants: u64,
    pub by: String,
}

/// Wire shape of `item/{id}.json`. Every field may be missing or `null`.
#[derive(Debug, Default, Deserialize)]
struct ItemBody {
    title: Option<String>,
    url: Option<String>,
    time: Option<i64>,
    score: Option<u64>,
    descendants: Option<u64>,
    #[serde(alias = "author")]
    by: Option<String>,
}

impl RawItem {
    /// Parse an item body. Empty text and JSON `null` yield an all-default
    /// item carrying only the requested id.
    pub fn from_body(id: u64, body: &str) -> Result<Self, serde_json::Error> {
        let trimmed = body.trim();
        let parsed: Option<ItemBody> = if trimmed.is_empty() {
            None
        } else {
            serde_json::from_str(trimmed)?
        };
        let b = parsed.unwrap_or_default();
        Ok(Self {
            id,
            title: b.title.unwrap_or_default(),
            url: b.url.filter(|u| !u.is_empty()),
            time: b.time.unwrap_or(0),
            score: b.score.unwrap_or(0),
            descendants: b.descendants.unwrap_or(0),
            by: b.by.unwrap_or_default(),
        })
    }
}

/// Remote source of a ranked item list.
#[async_trait::async_trait]
pub trait ItemSource: Send + Sync {
    /// Ranked ids, best first, at most `limit` of them.
    async fn fetch_ranked_ids(&self, limit: usize) -> Result<Vec<u64>, TransportError>;
    async fn fetch_item(&self, id: u64) -> Result<RawItem, TransportError>;
    fn name(&self) -> &'static str;
}
