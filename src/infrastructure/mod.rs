//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Audit: File-backed audit trail
//! - Adapters: Platform integrations (console)
//! - Plugins: Loading plugin modules from disk

pub mod adapters;
pub mod audit;
pub mod config;
pub mod plugins;
