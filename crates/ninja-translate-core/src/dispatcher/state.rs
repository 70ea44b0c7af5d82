//! Conversation state derived from the profile and the selection store.

use crate::selection::{SelectionEntry, TranslationSelection};

/// Where a user stands in the translation flow.
///
/// Derived on demand from profile presence and the selection store; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationState {
    /// The user never ran `/start`
    NoProfile,
    /// No source language chosen yet
    NeedsSource,
    /// Source chosen, waiting for the target button
    NeedsTarget {
        /// Chosen source code
        source: String,
    },
    /// A complete language pair is available
    Ready(TranslationSelection),
}

impl ConversationState {
    /// Compute the state. A completed pair wins over everything else.
    #[must_use]
    pub fn derive(has_profile: bool, entry: SelectionEntry) -> Self {
        match (entry.pair, entry.pending_source) {
            (Some(pair), _) => Self::Ready(pair),
            (None, Some(source)) => Self::NeedsTarget { source },
            (None, None) if has_profile => Self::NeedsSource,
            (None, None) => Self::NoProfile,
        }
    }
}
