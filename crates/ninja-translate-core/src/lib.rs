#![deny(missing_docs)]
//! NinjaTranslate core library.
//!
//! Platform-independent logic for the translation bot: settings, localization,
//! the translation and persistence gateways, the subscription gate and the
//! update dispatcher that decides which reply an incoming update receives.

/// Configuration management.
pub mod config;
/// Update routing and reply construction.
pub mod dispatcher;
/// Localized message templates and the language catalog.
pub mod i18n;
/// Translation gateway backed by an LLM chat-completions API.
pub mod llm;
/// Per-user translation direction kept in memory.
pub mod selection;
/// Persistence layer for user profiles (R2/S3).
pub mod storage;
/// Channel-membership gate.
pub mod subscription;
/// In-memory fakes for the gateway traits.
pub mod testing;
