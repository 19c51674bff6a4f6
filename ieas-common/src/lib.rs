//! # ieas Common Library
//!
//! Shared code for the Immich/Eagle album sync service:
//! - Error and result types
//! - Configuration loading and API URL resolution
//! - Year-folder naming rules
//! - Timestamp and UUID helpers

pub mod config;
pub mod error;
pub mod folders;
pub mod time;
pub mod uuid_utils;

pub use config::Settings;
pub use error::{Error, Result};
