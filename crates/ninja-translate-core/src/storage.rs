//! Storage layer for user profiles
//!
//! Provides a persistent storage implementation using Cloudflare R2 / AWS S3.
//! Each user owns exactly one JSON document, which gives upsert semantics
//! for free: writing the key again replaces the profile.

use crate::config::CoreSettings;
use crate::i18n::UiLang;
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use aws_types::region::Region;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const USERS_PREFIX: &str = "users/";
const PROFILE_FILE: &str = "profile.json";

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Error retrieving object from S3
    #[error("S3 Get error: {0}")]
    S3Get(Box<SdkError<GetObjectError>>),
    /// Error putting object into S3
    #[error("S3 put error: {0}")]
    S3Put(String),
    /// Error listing objects in S3
    #[error("S3 list error: {0}")]
    S3List(String),
    /// Error during JSON serialization or deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration error (missing credentials, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Platform identity of a user as seen on an incoming update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserIdentity {
    /// Stable numeric identifier owned by the messaging platform
    pub user_id: i64,
    /// Public username, without the leading `@`
    pub username: Option<String>,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: Option<String>,
}

/// Per-user profile persisted in storage
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserProfile {
    /// Platform user identifier
    pub user_id: i64,
    /// Display username
    #[serde(default)]
    pub username: Option<String>,
    /// Display first name
    #[serde(default)]
    pub first_name: String,
    /// Display last name
    #[serde(default)]
    pub last_name: Option<String>,
    /// Interface language code (`en` or `ar`)
    #[serde(default = "default_ui_lang")]
    pub ui_lang: String,
    /// Outcome of the last channel-membership check
    #[serde(default)]
    pub subscription_verified: bool,
    /// When the last channel-membership check ran
    #[serde(default)]
    pub subscription_last_checked: Option<DateTime<Utc>>,
    /// Last mutation of this profile
    pub last_activity: DateTime<Utc>,
}

fn default_ui_lang() -> String {
    UiLang::En.code().to_string()
}

impl UserProfile {
    /// Fresh profile with the default interface language.
    #[must_use]
    pub fn new(user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            username: None,
            first_name: String::new(),
            last_name: None,
            ui_lang: default_ui_lang(),
            subscription_verified: false,
            subscription_last_checked: None,
            last_activity: now,
        }
    }

    /// Overwrite the display fields; language and subscription data are kept.
    pub fn apply_identity(&mut self, identity: &UserIdentity, now: DateTime<Utc>) {
        self.username.clone_from(&identity.username);
        self.first_name.clone_from(&identity.first_name);
        self.last_name.clone_from(&identity.last_name);
        self.last_activity = now;
    }

    /// Interface language, English for unknown codes.
    #[must_use]
    pub fn ui(&self) -> UiLang {
        UiLang::resolve(&self.ui_lang)
    }
}

/// Aggregate counters shown to admins
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageStats {
    /// Every known profile
    pub total: u64,
    /// Profiles with the English interface
    pub english_ui: u64,
    /// Profiles with the Arabic interface
    pub arabic_ui: u64,
    /// Profiles whose last membership check passed
    pub subscribed: u64,
}

impl UsageStats {
    /// Count profiles into the four counters.
    pub fn tally<'a>(profiles: impl IntoIterator<Item = &'a UserProfile>) -> Self {
        profiles.into_iter().fold(Self::default(), |mut stats, p| {
            stats.total += 1;
            match p.ui_lang.as_str() {
                "en" => stats.english_ui += 1,
                "ar" => stats.arabic_ui += 1,
                _ => {}
            }
            if p.subscription_verified {
                stats.subscribed += 1;
            }
            stats
        })
    }
}

/// Interface for profile storage providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load a profile; `None` when the user never interacted.
    async fn get_profile(&self, user_id: i64) -> Result<Option<UserProfile>, StorageError>;
    /// Create the profile with the default interface language, or refresh
    /// the identity fields of an existing one.
    async fn upsert_identity(&self, identity: UserIdentity) -> Result<UserProfile, StorageError>;
    /// Persist the interface language, creating the profile if needed.
    async fn set_ui_lang(&self, user_id: i64, lang: UiLang) -> Result<(), StorageError>;
    /// Persist the outcome of a membership check, creating the profile if needed.
    async fn record_subscription_check(
        &self,
        user_id: i64,
        verified: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;
    /// Aggregate counters across all profiles.
    async fn stats(&self) -> Result<UsageStats, StorageError>;
    /// Check connection to storage
    async fn check_connection(&self) -> Result<(), String>;
}

/// R2-backed storage implementation
pub struct R2Storage {
    client: Client,
    bucket: String,
    cache: Cache<String, Arc<Vec<u8>>>,
}

impl R2Storage {
    /// Create a new R2 storage instance
    ///
    /// # Errors
    ///
    /// Returns an error if R2 configuration is missing.
    pub async fn new(settings: &CoreSettings) -> Result<Self, StorageError> {
        let endpoint_url = settings
            .r2_endpoint_url
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_ENDPOINT_URL is missing".into()))?;
        let access_key = settings
            .r2_access_key_id
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_ACCESS_KEY_ID is missing".into()))?;
        let secret_key = settings
            .r2_secret_access_key
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_SECRET_ACCESS_KEY is missing".into()))?;
        let bucket = settings
            .r2_bucket_name
            .as_ref()
            .ok_or_else(|| StorageError::Config("R2_BUCKET_NAME is missing".into()))?;

        let credentials = Credentials::new(access_key, secret_key, None, None, "r2-profiles");

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new("auto"))
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .endpoint_url(endpoint_url)
            .force_path_style(true)
            .build();

        // Profiles are small and read on almost every update
        let cache = Cache::builder()
            .max_capacity(50_000)
            .time_to_idle(Duration::from_secs(6 * 60 * 60))
            .build();

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: bucket.clone(),
            cache,
        })
    }

    async fn save_json<T: Serialize + Sync>(
        &self,
        key: &str,
        data: &T,
    ) -> Result<(), StorageError> {
        let body_bytes = serde_json::to_vec_pretty(data)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body_bytes.clone()))
            .content_type("application/json")
            .send()
            .await
            .map_err(|e| {
                let err = StorageError::S3Put(e.to_string());
                debug!("Put of {key} failed: {err}");
                err
            })?;

        // Only what the bucket accepted may be served from the cache
        self.cache
            .insert(key.to_string(), Arc::new(body_bytes))
            .await;

        Ok(())
    }

    async fn load_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        // Read-through
        if let Some(cached) = self.cache.get(key).await {
            match serde_json::from_slice(&cached) {
                Ok(data) => return Ok(Some(data)),
                Err(e) => {
                    warn!("Cache deserialization failed for {key}: {e}");
                    self.cache.invalidate(key).await;
                }
            }
        }

        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let data = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| StorageError::Io(std::io::Error::other(e)))?
                    .into_bytes();

                self.cache
                    .insert(key.to_string(), Arc::new(data.to_vec()))
                    .await;

                Ok(Some(serde_json::from_slice(&data)?))
            }
            Err(SdkError::ServiceError(err)) if err.err().is_no_such_key() => Ok(None),
            Err(e) => Err(StorageError::S3Get(Box::new(e))),
        }
    }

    /// Load-modify-store of one profile; creates it when absent.
    async fn modify_profile<F>(
        &self,
        user_id: i64,
        modifier: F,
    ) -> Result<UserProfile, StorageError>
    where
        F: FnOnce(&mut UserProfile) + Send,
    {
        let now = Utc::now();
        let mut profile = self
            .get_profile(user_id)
            .await?
            .unwrap_or_else(|| UserProfile::new(user_id, now));
        modifier(&mut profile);
        profile.last_activity = now;
        self.save_json(&profile_key(user_id), &profile).await?;
        Ok(profile)
    }

    async fn list_profile_keys(&self) -> Result<Vec<String>, StorageError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(USERS_PREFIX)
            .into_paginator()
            .send();

        let mut keys = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| StorageError::S3List(e.to_string()))?;
            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter(|key| key.ends_with(PROFILE_FILE))
                    .map(ToString::to_string),
            );
        }
        Ok(keys)
    }
}

#[async_trait]
impl ProfileStore for R2Storage {
    async fn get_profile(&self, user_id: i64) -> Result<Option<UserProfile>, StorageError> {
        self.load_json(&profile_key(user_id)).await
    }

    async fn upsert_identity(&self, identity: UserIdentity) -> Result<UserProfile, StorageError> {
        let now = Utc::now();
        self.modify_profile(identity.user_id, |profile| {
            profile.apply_identity(&identity, now);
        })
        .await
    }

    async fn set_ui_lang(&self, user_id: i64, lang: UiLang) -> Result<(), StorageError> {
        self.modify_profile(user_id, |profile| {
            profile.ui_lang = lang.code().to_string();
        })
        .await
        .map(|_| ())
    }

    async fn record_subscription_check(
        &self,
        user_id: i64,
        verified: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        self.modify_profile(user_id, |profile| {
            profile.subscription_verified = verified;
            profile.subscription_last_checked = Some(at);
        })
        .await
        .map(|_| ())
    }

    async fn stats(&self) -> Result<UsageStats, StorageError> {
        let keys = self.list_profile_keys().await?;
        let mut profiles = Vec::with_capacity(keys.len());
        for key in keys {
            match self.load_json::<UserProfile>(&key).await {
                Ok(Some(profile)) => profiles.push(profile),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable profile {key}: {e}"),
            }
        }
        Ok(UsageStats::tally(&profiles))
    }

    /// Check connection to R2 storage
    async fn check_connection(&self) -> Result<(), String> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                info!("Successfully connected to R2 storage.");
                Ok(())
            }
            Err(e) => {
                let err_msg = format!("R2 connectivity test failed: {e:#?}");
                error!("{}", err_msg);
                Err(err_msg)
            }
        }
    }
}

/// Returns the R2 key for a user's profile document
#[must_use]
pub fn profile_key(user_id: i64) -> String {
    format!("{USERS_PREFIX}{user_id}/{PROFILE_FILE}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    const NO_SUCH_KEY: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
        <Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message></Error>";
    const ACCESS_DENIED: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
        <Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>";

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0)
            .single()
            .unwrap_or_default()
    }

    #[test]
    fn test_profile_key_layout() {
        assert_eq!(profile_key(42), "users/42/profile.json");
        assert_eq!(profile_key(-7), "users/-7/profile.json");
    }

    #[test]
    fn test_new_profile_defaults() {
        let profile = UserProfile::new(1, at(1));
        assert_eq!(profile.ui_lang, "en");
        assert!(!profile.subscription_verified);
        assert!(profile.subscription_last_checked.is_none());
    }

    #[test]
    fn test_apply_identity_keeps_preferences() {
        let mut profile = UserProfile::new(1, at(1));
        profile.ui_lang = "ar".to_string();
        profile.subscription_verified = true;

        let identity = UserIdentity {
            user_id: 1,
            username: Some("ninja".to_string()),
            first_name: "Nin".to_string(),
            last_name: None,
        };
        profile.apply_identity(&identity, at(2));

        assert_eq!(profile.ui_lang, "ar");
        assert!(profile.subscription_verified);
        assert_eq!(profile.username.as_deref(), Some("ninja"));
        assert_eq!(profile.last_activity, at(2));
    }

    #[test]
    fn test_profile_deserializes_with_missing_fields() -> Result<(), serde_json::Error> {
        let json = r#"{"user_id": 5, "last_activity": "2024-05-01T10:00:00Z"}"#;
        let profile: UserProfile = serde_json::from_str(json)?;
        assert_eq!(profile.ui_lang, "en");
        assert_eq!(profile.ui(), UiLang::En);
        assert!(!profile.subscription_verified);
        Ok(())
    }

    #[test]
    fn test_stats_tally() {
        let mut a = UserProfile::new(1, at(1));
        a.subscription_verified = true;
        let mut b = UserProfile::new(2, at(1));
        b.ui_lang = "ar".to_string();
        let mut c = UserProfile::new(3, at(1));
        c.ui_lang = "ar".to_string();
        c.subscription_verified = true;

        let stats = UsageStats::tally([&a, &b, &c]);
        assert_eq!(
            stats,
            UsageStats {
                total: 3,
                english_ui: 1,
                arabic_ui: 2,
                subscribed: 2,
            }
        );
        assert_eq!(UsageStats::tally(std::iter::empty()), UsageStats::default());
    }

    /// Bucket endpoint where every object is missing and every write is refused.
    async fn read_only_bucket() -> std::io::Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(answer(stream));
            }
        });
        Ok(format!("http://{addr}"))
    }

    async fn answer(mut stream: TcpStream) -> std::io::Result<()> {
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        let head_end = loop {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                return Ok(());
            }
            raw.extend_from_slice(&buf[..n]);
            if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&raw[..head_end]).to_lowercase();
        if head.contains("expect: 100-continue") {
            stream.write_all(b"HTTP/1.1 100 Continue\r\n\r\n").await?;
        }
        let body_len = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let mut received = raw.len() - head_end;
        while received < body_len {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            received += n;
        }

        let (status, body) = if head.starts_with("put ") {
            ("403 Forbidden", ACCESS_DENIED)
        } else {
            ("404 Not Found", NO_SUCH_KEY)
        };
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/xml\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await
    }

    #[tokio::test]
    async fn test_failed_write_skips_cache() -> Result<(), Box<dyn std::error::Error>> {
        let settings = CoreSettings {
            r2_endpoint_url: Some(read_only_bucket().await?),
            r2_bucket_name: Some("profiles".to_string()),
            r2_access_key_id: Some("test-access".to_string()),
            r2_secret_access_key: Some("test-secret".to_string()),
            ..CoreSettings::default()
        };
        let storage = R2Storage::new(&settings).await?;

        assert!(storage.get_profile(9).await?.is_none());

        let result = storage.record_subscription_check(9, true, at(3)).await;
        assert!(matches!(result, Err(StorageError::S3Put(_))));

        // The bucket never accepted the profile, so it still does not exist
        assert!(storage.get_profile(9).await?.is_none());
        Ok(())
    }
}
