//! Document index collaborator interface and an in-process implementation.
//!
//! The orchestration layer only needs ranked passage retrieval and a
//! readiness check; vector construction, chunking, and embedding belong to
//! the index implementation behind this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::OrchestrationError;

/// One retrieved passage. Transient, scoped to a single retrieval call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub source: String,
    pub content: String,
    /// 1-based relevance rank.
    pub rank: usize,
}

/// Readiness snapshot of an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatus {
    pub ready: bool,
    pub count: usize,
}

/// Ranked passage retrieval over an indexed document set.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// The `k` most relevant passages for `query`, best first, ranks
    /// starting at 1. May return fewer than `k`, including none.
    async fn retrieve(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedPassage>, OrchestrationError>;

    fn status(&self) -> IndexStatus;
}

// ---------------------------------------------------------------------------
// In-memory index
// ---------------------------------------------------------------------------

/// Token-overlap scoring index over in-process passages.
///
/// Loaded once at startup and read-only afterwards, so concurrent retrieval
/// needs no locking. An empty index reports not-ready; grounded generation
/// against it is rejected upstream.
pub struct InMemoryIndex {
    passages: Vec<(String, String)>,
}

impl InMemoryIndex {
    /// Empty, not-ready index.
    pub fn empty() -> Self {
        Self {
            passages: Vec::new(),
        }
    }

    /// Build from (source, content) pairs.
    pub fn from_passages(passages: Vec<(String, String)>) -> Self {
        Self { passages }
    }

    /// Load every `.txt` file in `dir` as one passage named after the file.
    pub fn load_dir(dir: &std::path::Path) -> anyhow::Result<Self> {
        let mut passages = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let source = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string();
            let content = std::fs::read_to_string(&path)?;
            if !content.trim().is_empty() {
                passages.push((source, content));
            }
        }
        tracing::info!(count = passages.len(), "document index loaded");
        Ok(Self { passages })
    }

    fn tokens(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| c.is_ascii_punctuation()).to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }

    fn score(query_tokens: &[String], content: &str) -> usize {
        let content_tokens = Self::tokens(content);
        query_tokens
            .iter()
            .filter(|t| content_tokens.iter().any(|c| c == *t))
            .count()
    }
}

#[async_trait]
impl DocumentIndex for InMemoryIndex {
    async fn retrieve(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedPassage>, OrchestrationError> {
        let query_tokens = Self::tokens(query);

        let mut scored: Vec<(usize, &(String, String))> = self
            .passages
            .iter()
            .map(|p| (Self::score(&query_tokens, &p.1), p))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(i, (_, (source, content)))| RetrievedPassage {
                source: source.clone(),
                content: content.clone(),
                rank: i + 1,
            })
            .collect())
    }

    fn status(&self) -> IndexStatus {
        IndexStatus {
            ready: !self.passages.is_empty(),
            count: self.passages.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> InMemoryIndex {
        InMemoryIndex::from_passages(vec![
            (
                "leave-policy.txt".into(),
                "Annual leave requests must be filed five days in advance.".into(),
            ),
            (
                "expense-policy.txt".into(),
                "Expense reports require receipts for amounts over 50 dollars.".into(),
            ),
            (
                "onboarding.txt".into(),
                "New hires complete onboarding and annual leave training in week one.".into(),
            ),
        ])
    }

    #[test]
    fn empty_index_is_not_ready() {
        let status = InMemoryIndex::empty().status();
        assert!(!status.ready);
        assert_eq!(status.count, 0);
    }

    #[test]
    fn loaded_index_reports_count() {
        let status = sample_index().status();
        assert!(status.ready);
        assert_eq!(status.count, 3);
    }

    #[tokio::test]
    async fn retrieval_ranks_by_overlap_and_caps_at_k() {
        let index = sample_index();
        let passages = index.retrieve("annual leave requests", 2).await.unwrap();

        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].source, "leave-policy.txt");
        assert_eq!(passages[0].rank, 1);
        assert_eq!(passages[1].rank, 2);
    }

    #[tokio::test]
    async fn unrelated_query_returns_nothing() {
        let index = sample_index();
        let passages = index.retrieve("kubernetes ingress", 5).await.unwrap();
        assert!(passages.is_empty());
    }

    #[tokio::test]
    async fn punctuation_and_case_are_ignored() {
        let index = sample_index();
        let passages = index.retrieve("RECEIPTS?", 5).await.unwrap();
        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].source, "expense-policy.txt");
    }
}
