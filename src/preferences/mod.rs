//! Preference store collaborator interface and an in-process
//! implementation.
//!
//! The store owns per-user style profiles and the statistical adaptation
//! path: rated feedback nudges the tone axis matching the selected variant.
//! Relational persistence lives behind this trait; the in-memory store is
//! the default backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::error::OrchestrationError;
use crate::profile::{clamp_level, StyleProfile};
use crate::types::{FeedbackRecord, StyleVariant};

/// Per-user style profile persistence and statistical adaptation.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Adapt the stored profile for `user_id` from one rated feedback
    /// event. Returns `false` when the feedback could not be applied (for
    /// example an out-of-range rating); the caller then falls back to the
    /// basic heuristic path.
    async fn adapt_style(
        &self,
        user_id: &str,
        feedback_text: &str,
        rating: u8,
        selected_variant: StyleVariant,
    ) -> Result<bool, OrchestrationError>;

    async fn save_profile(&self, profile: &StyleProfile) -> Result<(), OrchestrationError>;

    async fn load_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<StyleProfile>, OrchestrationError>;
}

/// A stored feedback event with its arrival time.
#[derive(Debug, Clone)]
struct HistoryEntry {
    record: FeedbackRecord,
    received_at: DateTime<Utc>,
}

/// In-memory preference store.
///
/// Profiles live in a concurrent map; the feedback history is an append-only
/// log guarded by a lock that is never held across an await point.
#[derive(Default)]
pub struct InMemoryPreferenceStore {
    profiles: DashMap<String, StyleProfile>,
    history: RwLock<Vec<HistoryEntry>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded feedback events, for status reporting.
    pub fn history_len(&self) -> usize {
        self.history.read().len()
    }

    /// Snapshot of the feedback log, oldest first.
    pub fn history_snapshot(&self) -> Vec<(FeedbackRecord, DateTime<Utc>)> {
        self.history
            .read()
            .iter()
            .map(|entry| (entry.record.clone(), entry.received_at))
            .collect()
    }

    /// A rating of 4–5 nudges the selected variant's axis up, 1–2 nudges it
    /// down, 3 is neutral.
    fn rating_step(rating: u8) -> i16 {
        match rating {
            4 | 5 => 1,
            1 | 2 => -1,
            _ => 0,
        }
    }
}

#[async_trait]
impl PreferenceStore for InMemoryPreferenceStore {
    async fn adapt_style(
        &self,
        user_id: &str,
        feedback_text: &str,
        rating: u8,
        selected_variant: StyleVariant,
    ) -> Result<bool, OrchestrationError> {
        if !(1..=5).contains(&rating) {
            tracing::debug!(rating, "rating out of range; adaptation skipped");
            return Ok(false);
        }

        let mut profile = self
            .profiles
            .entry(user_id.to_string())
            .or_insert_with(|| StyleProfile::for_user(user_id))
            .clone();

        let step = Self::rating_step(rating);
        match selected_variant {
            StyleVariant::Direct => {
                profile.base_directness =
                    Some(clamp_level(profile.effective_directness() as i16 + step));
            }
            StyleVariant::Gentle => {
                profile.base_friendliness =
                    Some(clamp_level(profile.effective_friendliness() as i16 + step));
            }
            // A neutral pick expresses no directional preference; only the
            // history records it.
            StyleVariant::Neutral => {}
        }

        self.profiles.insert(user_id.to_string(), profile);
        self.history.write().push(HistoryEntry {
            record: FeedbackRecord {
                user_id: user_id.to_string(),
                selected_variant,
                rating: Some(rating),
                comment: feedback_text.to_string(),
            },
            received_at: Utc::now(),
        });

        Ok(true)
    }

    async fn save_profile(&self, profile: &StyleProfile) -> Result<(), OrchestrationError> {
        let user_id = profile.user_id_or_unknown().to_string();
        self.profiles.insert(user_id, profile.clone());
        Ok(())
    }

    async fn load_profile(
        &self,
        user_id: &str,
    ) -> Result<Option<StyleProfile>, OrchestrationError> {
        Ok(self.profiles.get(user_id).map(|p| p.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn high_rating_on_direct_raises_directness() {
        let store = InMemoryPreferenceStore::new();
        let applied = store
            .adapt_style("u-1", "good", 5, StyleVariant::Direct)
            .await
            .unwrap();
        assert!(applied);

        let profile = store.load_profile("u-1").await.unwrap().unwrap();
        // Unknown user starts from defaults (effective 5), then +1.
        assert_eq!(profile.base_directness, Some(6));
        assert_eq!(store.history_len(), 1);
    }

    #[tokio::test]
    async fn low_rating_on_gentle_lowers_friendliness() {
        let store = InMemoryPreferenceStore::new();
        store
            .save_profile(&StyleProfile {
                user_id: Some("u-2".into()),
                base_friendliness: Some(8),
                ..Default::default()
            })
            .await
            .unwrap();

        store
            .adapt_style("u-2", "not my tone", 1, StyleVariant::Gentle)
            .await
            .unwrap();
        let profile = store.load_profile("u-2").await.unwrap().unwrap();
        assert_eq!(profile.base_friendliness, Some(7));
    }

    #[tokio::test]
    async fn neutral_selection_only_records_history() {
        let store = InMemoryPreferenceStore::new();
        store
            .adapt_style("u-3", "fine", 5, StyleVariant::Neutral)
            .await
            .unwrap();

        let profile = store.load_profile("u-3").await.unwrap().unwrap();
        assert_eq!(profile.base_directness, None);
        assert_eq!(profile.base_friendliness, None);

        let history = store.history_snapshot();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].0.selected_variant, StyleVariant::Neutral);
        assert_eq!(history[0].0.comment, "fine");
    }

    #[tokio::test]
    async fn middling_rating_is_a_no_op_nudge() {
        let store = InMemoryPreferenceStore::new();
        store
            .adapt_style("u-4", "okay", 3, StyleVariant::Direct)
            .await
            .unwrap();
        let profile = store.load_profile("u-4").await.unwrap().unwrap();
        assert_eq!(profile.base_directness, Some(5));
    }

    #[tokio::test]
    async fn out_of_range_rating_reports_not_applied() {
        let store = InMemoryPreferenceStore::new();
        let applied = store
            .adapt_style("u-5", "??", 9, StyleVariant::Direct)
            .await
            .unwrap();
        assert!(!applied);
        assert!(store.load_profile("u-5").await.unwrap().is_none());
        assert_eq!(store.history_len(), 0);
    }

    #[tokio::test]
    async fn adaptation_clamps_at_scale_top() {
        let store = InMemoryPreferenceStore::new();
        store
            .save_profile(&StyleProfile {
                user_id: Some("u-6".into()),
                base_directness: Some(10),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .adapt_style("u-6", "sharper please", 5, StyleVariant::Direct)
            .await
            .unwrap();
        let profile = store.load_profile("u-6").await.unwrap().unwrap();
        assert_eq!(profile.base_directness, Some(10));
    }
}
