use crate::mentions::{build_identity_keys, normalize, scan};
use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// A mention-eligible reviewer (human or judge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    pub id: String,
    pub display_name: String,
}

impl Reviewer {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Reviewers indexed by every canonical key they answer to, so `@fact_integrity_reviewer`,
/// `@{Fact Integrity Reviewer}` and `@{fact  integrity REVIEWER}` all land on the same entry.
pub struct Roster {
    reviewers: Vec<Reviewer>,
    // canonical key -> reviewer index
    by_key: HashMap<String, usize>,
}

impl Roster {
    pub fn new(reviewers: Vec<Reviewer>) -> Self {
        let mut by_key: HashMap<String, usize> = HashMap::new();
        for (idx, reviewer) in reviewers.iter().enumerate() {
            for key in build_identity_keys(&reviewer.id, &reviewer.display_name) {
                if let Some(&existing) = by_key.get(&key) {
                    if existing != idx {
                        warn!(
                            "Mention key '{key}' of reviewer '{}' already claimed by '{}'",
                            reviewer.id, reviewers[existing].id
                        );
                    }
                    continue;
                }
                by_key.insert(key, idx);
            }
        }
        Self { reviewers, by_key }
    }

    /// Loads a roster from a JSON array of `{ "id", "displayName" }` records.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read roster file {path:?}"))?;
        let reviewers: Vec<Reviewer> =
            serde_json::from_str(&content).context("Failed to parse roster JSON")?;
        Ok(Self::new(reviewers))
    }

    pub fn reviewers(&self) -> &[Reviewer] {
        &self.reviewers
    }

    pub fn is_empty(&self) -> bool {
        self.reviewers.is_empty()
    }

    /// Resolves one raw mention (without the `@`) to a reviewer.
    pub fn lookup(&self, token: &str) -> Option<&Reviewer> {
        let key = normalize(token);
        if key.is_empty() {
            return None;
        }
        self.by_key.get(&key).map(|&idx| &self.reviewers[idx])
    }

    /// Distinct reviewers mentioned in `text`, in order of first mention.
    /// Mentions that match nobody are skipped.
    pub fn resolve_mentions(&self, text: &str) -> Vec<&Reviewer> {
        let mut seen = Vec::new();
        let mut resolved = Vec::new();
        for token in scan(text) {
            let Some(&idx) = self.by_key.get(&token.key) else {
                continue;
            };
            if !seen.contains(&idx) {
                seen.push(idx);
                resolved.push(&self.reviewers[idx]);
            }
        }
        resolved
    }
}
