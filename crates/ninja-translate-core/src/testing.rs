//! Testing helpers
//!
//! In-memory implementations of the gateway traits, usable from unit tests
//! and from the integration tests of every crate in the workspace.

use crate::i18n::UiLang;
use crate::llm::{TranslationError, Translator};
use crate::storage::{ProfileStore, StorageError, UsageStats, UserIdentity, UserProfile};
use crate::subscription::{ChannelDirectory, ChannelInfo, MembershipError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Profile store kept in a map. Can be switched into a failing mode.
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: Mutex<HashMap<i64, UserProfile>>,
    failing: AtomicBool,
}

impl InMemoryProfileStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a profile in place, replacing any existing one.
    pub async fn insert(&self, profile: UserProfile) {
        self.profiles.lock().await.insert(profile.user_id, profile);
    }

    /// Snapshot of a stored profile.
    pub async fn profile(&self, user_id: i64) -> Option<UserProfile> {
        self.profiles.lock().await.get(&user_id).cloned()
    }

    /// Number of stored profiles.
    pub async fn len(&self) -> usize {
        self.profiles.lock().await.len()
    }

    /// True when nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.profiles.lock().await.is_empty()
    }

    /// Make every following call fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Config("store unavailable".into()));
        }
        Ok(())
    }

    async fn modify<F>(&self, user_id: i64, modifier: F) -> Result<UserProfile, StorageError>
    where
        F: FnOnce(&mut UserProfile) + Send,
    {
        self.check()?;
        let now = Utc::now();
        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .entry(user_id)
            .or_insert_with(|| UserProfile::new(user_id, now));
        modifier(profile);
        profile.last_activity = now;
        Ok(profile.clone())
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn get_profile(&self, user_id: i64) -> Result<Option<UserProfile>, StorageError> {
        self.check()?;
        Ok(self.profile(user_id).await)
    }

    async fn upsert_identity(&self, identity: UserIdentity) -> Result<UserProfile, StorageError> {
        let now = Utc::now();
        self.modify(identity.user_id, |profile| {
            profile.apply_identity(&identity, now);
        })
        .await
    }

    async fn set_ui_lang(&self, user_id: i64, lang: UiLang) -> Result<(), StorageError> {
        self.modify(user_id, |profile| profile.ui_lang = lang.code().to_string())
            .await
            .map(|_| ())
    }

    async fn record_subscription_check(
        &self,
        user_id: i64,
        verified: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.modify(user_id, |profile| {
            profile.subscription_verified = verified;
            profile.subscription_last_checked = Some(at);
        })
        .await
        .map(|_| ())
    }

    async fn stats(&self) -> Result<UsageStats, StorageError> {
        self.check()?;
        Ok(UsageStats::tally(self.profiles.lock().await.values()))
    }

    async fn check_connection(&self) -> Result<(), String> {
        self.check().map_err(|e| e.to_string())
    }
}

/// One recorded translation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationCall {
    /// Text to translate
    pub text: String,
    /// Bare source language name
    pub source: String,
    /// Bare target language name
    pub target: String,
}

/// Translator answering with a fixed text or a fixed failure.
pub struct FakeTranslator {
    reply: Option<String>,
    calls: Mutex<Vec<TranslationCall>>,
}

impl FakeTranslator {
    /// Always succeeds with `reply`.
    #[must_use]
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always fails with a `badResponse` error.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every request seen so far.
    pub async fn calls(&self) -> Vec<TranslationCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, TranslationError> {
        self.calls.lock().await.push(TranslationCall {
            text: text.to_string(),
            source: source_language.to_string(),
            target: target_language.to_string(),
        });
        self.reply
            .clone()
            .ok_or_else(|| TranslationError::BadResponse("status 503 - unavailable".into()))
    }
}

/// Channel directory backed by explicit member lists.
#[derive(Default)]
pub struct FakeChannelDirectory {
    members: Mutex<HashMap<String, HashSet<i64>>>,
    broken: Mutex<HashSet<String>>,
    titles: HashMap<String, ChannelInfo>,
    membership_calls: AtomicUsize,
}

impl FakeChannelDirectory {
    /// Directory where nobody is a member of anything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a title and username to a channel.
    #[must_use]
    pub fn with_title(mut self, channel: &str, title: &str, username: Option<&str>) -> Self {
        self.titles.insert(
            channel.to_string(),
            ChannelInfo {
                title: Some(title.to_string()),
                username: username.map(ToString::to_string),
            },
        );
        self
    }

    /// Make the user a member of the channel.
    pub async fn join(&self, channel: &str, user_id: i64) {
        self.members
            .lock()
            .await
            .entry(channel.to_string())
            .or_default()
            .insert(user_id);
    }

    /// Remove the user from the channel.
    pub async fn leave(&self, channel: &str, user_id: i64) {
        if let Some(members) = self.members.lock().await.get_mut(channel) {
            members.remove(&user_id);
        }
    }

    /// Make every call about the channel fail.
    pub async fn break_channel(&self, channel: &str) {
        self.broken.lock().await.insert(channel.to_string());
    }

    /// Number of `is_member` calls answered so far.
    pub fn membership_calls(&self) -> usize {
        self.membership_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelDirectory for FakeChannelDirectory {
    async fn is_member(&self, channel: &str, user_id: i64) -> Result<bool, MembershipError> {
        self.membership_calls.fetch_add(1, Ordering::SeqCst);
        if self.broken.lock().await.contains(channel) {
            return Err(MembershipError::Api("Bad Request: chat not found".into()));
        }
        Ok(self
            .members
            .lock()
            .await
            .get(channel)
            .is_some_and(|members| members.contains(&user_id)))
    }

    async fn describe(&self, channel: &str) -> Result<ChannelInfo, MembershipError> {
        if self.broken.lock().await.contains(channel) {
            return Err(MembershipError::Api("Bad Request: chat not found".into()));
        }
        self.titles
            .get(channel)
            .cloned()
            .ok_or_else(|| MembershipError::Api("Bad Request: chat not found".into()))
    }
}
