// src/enrich.rs
//! Derived item attributes: originating domain and matched keywords.

use crate::ingest::types::RawItem;
use crate::snapshot::EnrichedItem;

pub const DEFAULT_KEYWORDS: &[&str] = &["chatgpt", "claude", "anthropic", "gpt", "llm"];

/// Stateless enricher over a fixed keyword vocabulary.
#[derive(Debug, Clone)]
pub struct ItemEnricher {
    vocabulary: Vec<String>,
}

impl Default for ItemEnricher {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().map(|s| s.to_string()))
    }
}

impl ItemEnricher {
    /// Entries are lower-cased and de-duplicated; blank entries are dropped.
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for kw in vocabulary {
            let kw = kw.as_ref().trim().to_lowercase();
            if !kw.is_empty() && !out.contains(&kw) {
                out.push(kw);
            }
        }
        Self { vocabulary: out }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn enrich(&self, raw: RawItem) -> EnrichedItem {
        let domain = raw.url.as_deref().map(extract_domain).unwrap_or_default();
        let keywords = self.match_keywords(&raw.title);
        EnrichedItem {
            raw,
            domain,
            keywords,
        }
    }

    /// Vocabulary entries contained in `title`, compared case-insensitively.
    ///
    /// This is stricter than plain substring containment: an occurrence lying
    /// entirely inside an occurrence of a longer vocabulary entry does not
    /// count. "chatgpt" matches `chatgpt` only, while plain containment would
    /// also report `gpt`. A separate occurrence ("ChatGPT vs GPT-5") still
    /// reports both.
    pub fn match_keywords(&self, title: &str) -> Vec<String> {
        let lower = title.to_lowercase();
        let spans: Vec<(usize, usize, usize)> = self
            .vocabulary
            .iter()
            .enumerate()
            .flat_map(|(k, kw)| {
                lower
                    .match_indices(kw.as_str())
                    .map(move |(start, m)| (k, start, start + m.len()))
            })
            .collect();

        self.vocabulary
            .iter()
            .enumerate()
            .filter(|(k, kw)| {
                spans
                    .iter()
                    .filter(|(owner, _, _)| owner == k)
                    .any(|&(_, start, end)| {
                        !spans.iter().any(|&(other, s, e)| {
                            other != *k
                                && self.vocabulary[other].len() > kw.len()
                                && s <= start
                                && end <= e
                        })
                    })
            })
            .map(|(_, kw)| kw.clone())
            .collect()
    }
}

/// Host component of an absolute URL; empty for anything that does not parse
/// or carries no host (`mailto:`, relative paths, "").
pub fn extract_domain(raw_url: &str) -> String {
    url::Url::parse(raw_url.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default()
}
