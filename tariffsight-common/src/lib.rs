//! # TariffSight Common Library
//!
//! Shared code for the TariffSight service crates including:
//! - Error types
//! - Application event types (AppEvent enum) and EventBus
//! - Configuration loading and root folder resolution
//! - Database initialization and schema

pub mod config;
pub mod db;
pub mod error;
pub mod events;

pub use error::{Error, Result};
