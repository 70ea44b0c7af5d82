#![deny(missing_docs)]
//! Telegram transport adapter for NinjaTranslate.

/// Telegram-specific bot/transport implementation.
pub mod bot;
/// Telegram transport configuration.
pub mod config;
/// Liveness endpoint for the hosting platform.
pub mod health;
/// Telegram runtime entrypoint.
pub mod runner;
