//! Shared utilities for concord
//!
//! This crate provides common functionality used across the concord workspace,
//! including logging setup, settings management, and JSON file loading.

pub mod config;
pub mod logging;

pub use config::{Settings, SettingsError, load_json};
pub use logging::{LogFormat, init_tracing, init_tracing_with_level};
