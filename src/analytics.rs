// src/analytics.rs
//! Read-only views over a [`Snapshot`]: keyword and domain histograms,
//! trending title words, and the score/comment dataset.
//!
//! Every ranking sorts by count descending and breaks ties by the order in
//! which the key was first seen in the snapshot.

use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::snapshot::Snapshot;

pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_MIN_WORD_LEN: usize = 4;
pub const DEFAULT_STOP_WORDS: &[&str] = &["the", "and", "for", "with", "from", "using"];

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word regex"));

/// Counts keyed by first appearance.
#[derive(Default)]
struct Tally {
    order: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl Tally {
    fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&i) => self.order[i].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.order.len());
                self.order.push((key.to_string(), 1));
            }
        }
    }

    /// Stable sort keeps first-seen order among equal counts.
    fn most_common(mut self, n: usize) -> Vec<(String, usize)> {
        self.order.sort_by(|a, b| b.1.cmp(&a.1));
        self.order.truncate(n);
        self.order
    }
}

pub fn keyword_frequency(snapshot: &Snapshot) -> BTreeMap<String, usize> {
    let mut out = BTreeMap::new();
    for kw in snapshot.items().iter().flat_map(|it| it.keywords.iter()) {
        *out.entry(kw.clone()).or_insert(0) += 1;
    }
    out
}

pub fn top_domains(snapshot: &Snapshot, n: usize) -> Vec<(String, usize)> {
    let mut tally = Tally::default();
    for it in snapshot.items().iter().filter(|it| !it.domain.is_empty()) {
        tally.add(&it.domain);
    }
    tally.most_common(n)
}

/// Title word ranking with the default stop words and minimum length.
pub fn trending_words(snapshot: &Snapshot, n: usize) -> Vec<(String, usize)> {
    let stop: HashSet<String> = DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect();
    trending_words_with(snapshot, n, &stop, DEFAULT_MIN_WORD_LEN)
}

/// Lower-cased `\w+` tokens of every title, minus stop words and tokens
/// shorter than `min_len` characters.
pub fn trending_words_with(
    snapshot: &Snapshot,
    n: usize,
    stop_words: &HashSet<String>,
    min_len: usize,
) -> Vec<(String, usize)> {
    let mut tally = Tally::default();
    for it in snapshot.items() {
        let title = it.raw.title.to_lowercase();
        for m in WORD_RE.find_iter(&title) {
            let w = m.as_str();
            if w.chars().count() < min_len || stop_words.contains(w) {
                continue;
            }
            tally.add(w);
        }
    }
    tally.most_common(n)
}

/// `(score, descendants)` per item, in snapshot order.
pub fn score_comment_pairs(snapshot: &Snapshot) -> Vec<(u64, u64)> {
    snapshot
        .items()
        .iter()
        .map(|it| (it.raw.score, it.raw.descendants))
        .collect()
}

/// Keyword and domain histograms computed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insights {
    pub keyword_freq: BTreeMap<String, usize>,
    pub top_domains: Vec<(String, usize)>,
}

impl Insights {
    pub fn compute(snapshot: &Snapshot, n: usize) -> Self {
        Self {
            keyword_freq: keyword_frequency(snapshot),
            top_domains: top_domains(snapshot, n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::ItemEnricher;
    use crate::ingest::types::RawItem;
    use chrono::Utc;

    fn snap(rows: &[(&str, &str, u64, u64)]) -> Snapshot {
        let e = ItemEnricher::default();
        let items = rows
            .iter()
            .enumerate()
            .map(|(i, (title, url, score, desc))| {
                e.enrich(RawItem {
                    id: i as u64 + 1,
                    title: title.to_string(),
                    url: Some(url.to_string()),
                    score: *score,
                    descendants: *desc,
                    ..RawItem::default()
                })
            })
            .collect();
        Snapshot::new(items, Utc::now())
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let s = snap(&[
            ("a", "http://z.com/1", 0, 0),
            ("b", "http://y.com/1", 0, 0),
            ("c", "http://y.com/2", 0, 0),
            ("d", "http://x.com/1", 0, 0),
            ("e", "http://z.com/2", 0, 0),
        ]);
        assert_eq!(
            top_domains(&s, 10),
            vec![
                ("z.com".to_string(), 2),
                ("y.com".to_string(), 2),
                ("x.com".to_string(), 1)
            ]
        );
        assert_eq!(top_domains(&s, 1), vec![("z.com".to_string(), 2)]);
        assert!(top_domains(&s, 0).is_empty());
    }

    #[test]
    fn trending_drops_short_tokens_and_stop_words() {
        let s = snap(&[
            ("Using Rust with WASM: the 2024 guide", "", 0, 0),
            ("Rust_lang from scratch; rust again", "", 0, 0),
        ]);
        let words = trending_words(&s, 10);
        assert_eq!(
            words,
            vec![
                ("rust".to_string(), 2),
                ("wasm".to_string(), 1),
                ("2024".to_string(), 1),
                ("guide".to_string(), 1),
                ("rust_lang".to_string(), 1),
                ("scratch".to_string(), 1),
                ("again".to_string(), 1),
            ]
        );
    }

    #[test]
    fn trending_counts_non_ascii_words_by_chars() {
        let s = snap(&[("Čeština über čau", "", 0, 0)]);
        let words: Vec<String> = trending_words(&s, 10).into_iter().map(|(w, _)| w).collect();
        assert_eq!(words, vec!["čeština", "über"]);
    }

    #[test]
    fn pairs_follow_snapshot_order() {
        let s = snap(&[("a", "", 10, 3), ("b", "", 0, 0), ("c", "", 7, 99)]);
        assert_eq!(score_comment_pairs(&s), vec![(10, 3), (0, 0), (7, 99)]);
    }

    #[test]
    fn empty_snapshot_yields_empty_views() {
        let s = Snapshot::empty(Utc::now());
        assert!(keyword_frequency(&s).is_empty());
        assert!(top_domains(&s, 10).is_empty());
        assert!(trending_words(&s, 10).is_empty());
        assert!(score_comment_pairs(&s).is_empty());
    }
}
