// src/snapshot.rs
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ingest::types::RawItem;

/// A raw item plus the attributes derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedItem {
    #[serde(flatten)]
    pub raw: RawItem,
    /// Host of `raw.url`, empty when the url is absent or unparsable.
    pub domain: String,
    /// Vocabulary entries found in the title, in vocabulary order.
    pub keywords: Vec<String>,
}

/// One immutable capture of the ranked item set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    items: Vec<EnrichedItem>,
    captured_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(items: Vec<EnrichedItem>, captured_at: DateTime<Utc>) -> Self {
        Self { items, captured_at }
    }

    pub fn empty(captured_at: DateTime<Utc>) -> Self {
        Self::new(Vec::new(), captured_at)
    }

    /// Items in upstream ranking order.
    pub fn items(&self) -> &[EnrichedItem] {
        &self.items
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
