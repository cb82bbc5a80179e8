// src/ingest/mod.rs
pub mod hn;
pub mod types;

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::error::TransportError;
use crate::ingest::types::{ItemSource, RawItem};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_items_fetched_total",
            "Item bodies fetched from the upstream source."
        );
        describe_counter!(
            "ingest_batch_errors_total",
            "Ranked batches aborted by a transport error."
        );
    });
}

/// Drop repeated ids, keeping the first (best ranked) occurrence.
pub fn dedup_ranked(ids: Vec<u64>) -> Vec<u64> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Fetch the ranked id list and resolve every id to an item.
///
/// Item bodies are fetched with at most `concurrency` requests in flight.
/// Results are put back into ranked order by position, so completion order
/// never leaks into the output. The first failure aborts the batch and drops
/// the fetches still pending.
pub async fn fetch_ranked_items(
    source: &dyn ItemSource,
    limit: usize,
    concurrency: usize,
) -> Result<Vec<RawItem>, TransportError> {
    ensure_metrics_described();

    let ids = dedup_ranked(source.fetch_ranked_ids(limit).await?);
    let ids: Vec<u64> = ids.into_iter().take(limit).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut slots: Vec<Option<RawItem>> = vec![None; ids.len()];
    let mut pending = stream::iter(ids.iter().copied().enumerate())
        .map(|(idx, id)| async move { (idx, source.fetch_item(id).await) })
        .buffer_unordered(concurrency.max(1));

    while let Some((idx, res)) = pending.next().await {
        match res {
            Ok(item) => slots[idx] = Some(item),
            Err(e) => {
                counter!("ingest_batch_errors_total").increment(1);
                tracing::debug!(
                    target: "ingest",
                    source = source.name(),
                    id = ids[idx],
                    error = %e,
                    "item fetch failed; aborting batch"
                );
                return Err(e);
            }
        }
    }

    counter!("ingest_items_fetched_total").increment(ids.len() as u64);
    Ok(slots.into_iter().flatten().collect())
}
