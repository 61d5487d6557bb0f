// crates/core/src/lib.rs
//! Session discovery and enrichment for the agentdeck dashboard.
//!
//! The storage tree is owned by the agent process; this crate only ever
//! reads it. A scan may race with the agent writing new files, so every
//! read degrades to a fallback instead of failing the whole scan.

pub mod cache;
pub mod discovery;
pub mod enrich;
pub mod extract;
pub mod types;

pub use cache::*;
pub use discovery::*;
pub use enrich::*;
pub use extract::*;
pub use types::*;
