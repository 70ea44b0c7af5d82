//! In-memory store of each user's translation direction.
//!
//! Entries live as long as the process. Updates from the same user are
//! not ordered against each other: two overlapping button presses may
//! race, the last write wins.

use moka::future::Cache;

/// A completed (source, target) language pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSelection {
    /// Catalog code of the source language
    pub source: String,
    /// Catalog code of the target language, never equal to `source`
    pub target: String,
}

impl TranslationSelection {
    /// Build a selection, rejecting identical codes.
    #[must_use]
    pub fn new(source: &str, target: &str) -> Option<Self> {
        (source != target).then(|| Self {
            source: source.to_string(),
            target: target.to_string(),
        })
    }
}

/// What the store knows about one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionEntry {
    /// Last completed language pair
    pub pair: Option<TranslationSelection>,
    /// Source chosen on the picker while the target is still outstanding
    pub pending_source: Option<String>,
}

/// Process-wide, concurrency-safe selection map.
#[derive(Clone)]
pub struct SelectionStore {
    entries: Cache<i64, SelectionEntry>,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionStore {
    /// Create an empty store; entries never expire.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().build(),
        }
    }

    /// Everything known about the user, empty if nothing was chosen yet.
    pub async fn entry(&self, user_id: i64) -> SelectionEntry {
        self.entries.get(&user_id).await.unwrap_or_default()
    }

    /// The user's completed language pair, if any.
    pub async fn get(&self, user_id: i64) -> Option<TranslationSelection> {
        self.entry(user_id).await.pair
    }

    /// Remember the source picked on the first step of the flow.
    pub async fn set_pending(&self, user_id: i64, source: &str) {
        let mut entry = self.entry(user_id).await;
        entry.pending_source = Some(source.to_string());
        self.entries.insert(user_id, entry).await;
    }

    /// Store a completed pair, replacing the previous one.
    pub async fn set(&self, user_id: i64, selection: TranslationSelection) {
        let entry = SelectionEntry {
            pair: Some(selection),
            pending_source: None,
        };
        self.entries.insert(user_id, entry).await;
    }
}
