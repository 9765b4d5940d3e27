//! Incremental sync of listings against a persisted watermark
//!
//! Safe to re-run: the watermark only advances after a complete fetch.

mod store;
mod tracker;

pub use store::{ConfigWatermarkStore, InMemoryWatermarkStore, LAST_MODIFIED_KEY, WatermarkStore};
pub use tracker::{SyncKind, SyncOptions, SyncReport, SyncTracker, sync_since};
