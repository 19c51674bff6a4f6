//! Configuration loading and API base URL resolution
//!
//! Every setting is read from the environment (or the matching long CLI
//! flag). When `ENV=development` a `.env` file in the working directory is
//! loaded first.

use crate::{Error, Result};
use clap::builder::RangedU64ValueParser;
use clap::{Parser, ValueEnum};
use std::time::Duration;

/// Default Eagle API port
pub const DEFAULT_EAGLE_PORT: u16 = 41595;
/// Default Immich API port
pub const DEFAULT_IMMICH_PORT: u16 = 2283;

/// URL scheme used when a configured host carries none
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Process settings for ieas-sync
#[derive(Parser, Debug, Clone)]
#[command(name = "ieas-sync")]
#[command(about = "Keeps an Eagle library in sync with an Immich server")]
#[command(version)]
pub struct Settings {
    /// Scheme for the Eagle API when the host has none
    #[arg(long, env = "EAGLE_API_SCHEMA", value_enum, default_value_t = Scheme::Http)]
    pub eagle_api_schema: Scheme,

    /// Eagle API host (may include scheme and port)
    #[arg(long, env = "EAGLE_API_HOST")]
    pub eagle_api_host: String,

    /// Eagle API port, used when the host has none
    #[arg(long, env = "EAGLE_API_PORT", default_value_t = DEFAULT_EAGLE_PORT,
          value_parser = clap::value_parser!(u16).range(1..))]
    pub eagle_api_port: u16,

    /// Eagle API token
    #[arg(long, env = "EAGLE_API_KEY", hide_env_values = true, value_parser = non_blank)]
    pub eagle_api_key: String,

    /// Scheme for the Immich API when the host has none
    #[arg(long, env = "IMMICH_API_SCHEMA", value_enum, default_value_t = Scheme::Http)]
    pub immich_api_schema: Scheme,

    /// Immich API host (may include scheme and port)
    #[arg(long, env = "IMMICH_API_HOST")]
    pub immich_api_host: String,

    /// Immich API port, used when the host has none
    #[arg(long, env = "IMMICH_API_PORT", default_value_t = DEFAULT_IMMICH_PORT,
          value_parser = clap::value_parser!(u16).range(1..))]
    pub immich_api_port: u16,

    /// Immich API key
    #[arg(long, env = "IMMICH_API_KEY", hide_env_values = true, value_parser = non_blank)]
    pub immich_api_key: String,

    /// Address the bridge proxy binds to
    #[arg(long, env = "BRIDGE_HOST", default_value = "127.0.0.1")]
    pub bridge_host: String,

    /// Port the bridge proxy binds to
    #[arg(long, env = "BRIDGE_PORT", default_value_t = 8765,
          value_parser = clap::value_parser!(u16).range(1..))]
    pub bridge_port: u16,

    /// Base URL Eagle uses to reach the bridge (derived from host/port if unset)
    #[arg(long, env = "BRIDGE_URL")]
    pub bridge_url: Option<String>,

    /// Seconds between reconciliation cycles
    #[arg(long, env = "SCAN_INTERVAL", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..=60))]
    pub scan_interval: u64,

    /// Maximum concurrent catalog calls within one reconciliation phase
    #[arg(long, env = "SYNC_CONCURRENCY", default_value_t = 8,
          value_parser = RangedU64ValueParser::<usize>::new().range(1..=256))]
    pub sync_concurrency: usize,

    /// Pending correction tasks before the engine blocks
    #[arg(long, env = "CORRECTION_QUEUE_CAPACITY", default_value_t = 100,
          value_parser = RangedU64ValueParser::<usize>::new().range(1..=10_000))]
    pub correction_queue_capacity: usize,

    /// Assets requested per Immich search page
    #[arg(long, env = "IMMICH_PAGE_SIZE", default_value_t = 1000,
          value_parser = RangedU64ValueParser::<usize>::new().range(1..=5_000))]
    pub immich_page_size: usize,
}

impl Settings {
    /// Load settings from the process environment and command line
    ///
    /// Loads `.env` first when `ENV=development`.
    pub fn load() -> Result<Self> {
        load_dotenv_if_development();
        Self::try_parse().map_err(|e| Error::Config(e.to_string()))
    }

    /// Load settings from the environment only, ignoring process arguments
    pub fn from_env() -> Result<Self> {
        Self::try_parse_from(["ieas-sync"]).map_err(|e| Error::Config(e.to_string()))
    }

    /// Eagle API base URL, e.g. `http://localhost:41595/api`
    pub fn eagle_api_url(&self) -> String {
        api_base_url(self.eagle_api_schema, &self.eagle_api_host, self.eagle_api_port)
    }

    /// Immich API base URL, e.g. `http://immich:2283/api`
    pub fn immich_api_url(&self) -> String {
        api_base_url(self.immich_api_schema, &self.immich_api_host, self.immich_api_port)
    }

    /// Socket address string the bridge binds to
    pub fn bridge_bind_addr(&self) -> String {
        format!("{}:{}", self.bridge_host, self.bridge_port)
    }

    /// Base URL embedded in import requests so Eagle can reach the bridge
    pub fn bridge_public_url(&self) -> String {
        if let Some(url) = &self.bridge_url {
            return url.trim_end_matches('/').to_string();
        }

        let host = match self.bridge_host.as_str() {
            "0.0.0.0" | "::" | "[::]" => "127.0.0.1",
            other => other,
        };
        format!("http://{}:{}", host, self.bridge_port)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }
}

/// Load `.env` when running with `ENV=development`
pub fn load_dotenv_if_development() {
    if std::env::var("ENV").as_deref() == Ok("development") {
        match dotenv::dotenv() {
            Ok(path) => tracing::info!(path = %path.display(), "Loaded .env file"),
            Err(e) => tracing::warn!(error = %e, "ENV=development but no .env file loaded"),
        }
    }
}

fn non_blank(value: &str) -> std::result::Result<String, String> {
    if value.trim().is_empty() {
        Err("value must not be blank".to_string())
    } else {
        Ok(value.to_string())
    }
}

/// Compose an API base URL from a host that may or may not carry a scheme
/// and a port
///
/// A missing scheme is filled from `scheme`, a missing port from `port`,
/// and `/api` is appended.
pub fn api_base_url(scheme: Scheme, host: &str, port: u16) -> String {
    let host = host.trim().trim_end_matches('/');

    let (scheme_part, rest) = match host.split_once("://") {
        Some((s, rest)) => (s.to_string(), rest),
        None => (scheme.as_str().to_string(), host),
    };

    let (authority, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, ""),
    };

    let has_port = authority
        .rsplit_once(':')
        .map(|(_, p)| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false);

    if has_port {
        format!("{}://{}{}/api", scheme_part, authority, path)
    } else {
        format!("{}://{}:{}{}/api", scheme_part, authority, port, path)
    }
}
