//! ieas-sync library
//!
//! Keeps an Eagle library eventually consistent with an Immich server:
//! - [`engine`]: periodic diff-and-mutate reconciliation
//! - [`correction`]: deferred on-disk metadata patches
//! - [`bridge`]: local HTTP relay serving Immich bytes to Eagle
//! - [`client`]: credential-injecting catalog clients

pub mod bridge;
pub mod catalog;
pub mod client;
pub mod correction;
pub mod engine;
pub mod error;
pub mod models;
pub mod shutdown;

pub use bridge::{build_router, BridgeState};
pub use catalog::{LibraryCatalog, ServerCatalog};
pub use engine::{CycleReport, Engine, EngineConfig};
pub use error::{BridgeError, BridgeResult};
