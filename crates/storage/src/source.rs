//! JSON-lines sources addressed by a glob pattern relative to a root.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::backend::StorageBackend;
use crate::error::StorageError;

/// A `/`-separated glob where `*` matches any run of characters within one
/// segment and `?` matches exactly one character. `**` is not supported:
/// every pattern fixes the directory depth of the files it selects.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    raw: String,
    segments: Vec<Vec<char>>,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Self {
        let raw = pattern.trim_matches('/').to_string();
        let segments = raw.split('/').map(|s| s.chars().collect()).collect();
        Self { raw, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Leading segments without wildcards; used to narrow the listing.
    pub fn literal_prefix(&self) -> String {
        self.segments
            .iter()
            .take_while(|seg| !seg.iter().any(|c| *c == '*' || *c == '?'))
            .map(|seg| seg.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn matches(&self, key: &str) -> bool {
        let parts: Vec<&str> = key.split('/').collect();
        if parts.len() != self.segments.len() {
            return false;
        }
        self.segments.iter().zip(parts).all(|(pattern, part)| {
            let text: Vec<char> = part.chars().collect();
            wildcard_match(pattern, &text)
        })
    }
}

/// Iterative wildcard match with single-star backtracking.
fn wildcard_match(pattern: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

/// Reads JSON-lines files under one storage root.
pub struct JsonLinesSource {
    backend: Arc<StorageBackend>,
}

impl JsonLinesSource {
    pub fn new(backend: Arc<StorageBackend>) -> Self {
        Self { backend }
    }

    /// Keys matching `pattern`, in lexicographic order.
    pub async fn matching_keys(&self, pattern: &GlobPattern) -> Result<Vec<String>, StorageError> {
        let keys = self.backend.list(&pattern.literal_prefix()).await?;
        Ok(keys.into_iter().filter(|k| pattern.matches(k)).collect())
    }

    /// Parse every non-blank line of every matching file as `T`.
    ///
    /// Records come back in file order, then line order. A line that is not
    /// UTF-8 or fails to parse aborts the whole read.
    pub async fn read<T: DeserializeOwned>(&self, pattern: &str) -> Result<Vec<T>, StorageError> {
        let pattern = GlobPattern::new(pattern);
        let keys = self.matching_keys(&pattern).await?;
        if keys.is_empty() {
            return Err(StorageError::NoMatchingFiles {
                pattern: self.backend.describe(pattern.as_str()),
            });
        }

        let mut records = Vec::new();
        for key in &keys {
            let data = self.backend.get(key).await?;
            let before = records.len();

            for (idx, raw) in data.split(|b| *b == b'\n').enumerate() {
                let line = std::str::from_utf8(raw)
                    .map_err(|source| StorageError::InvalidEncoding {
                        key: self.backend.describe(key),
                        line: idx + 1,
                        source,
                    })?
                    .trim();
                if line.is_empty() {
                    continue;
                }
                let record = serde_json::from_str(line).map_err(|source| StorageError::MalformedRecord {
                    key: self.backend.describe(key),
                    line: idx + 1,
                    source,
                })?;
                records.push(record);
            }

            debug!(key = %key, records = records.len() - before, "read source file");
        }

        info!(
            pattern = %pattern.as_str(),
            files = keys.len(),
            records = records.len(),
            "Loaded JSON-lines source"
        );
        Ok(records)
    }
}
