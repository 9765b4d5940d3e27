//! Pushbullet crate - Business logic for the `pb` command-line client
//!
//! This crate provides:
//! - Domain models (Item, Collection, Watermark)
//! - The Pushbullet API client over a pluggable transport
//! - Response classification and the paginated fetcher
//! - Incremental sync against a persisted watermark
//! - Device/contact resolution for push targets
//! - Action handlers for pushing, deleting and SMS
//!
//! Everything is synchronous and single-threaded; pages are fetched one
//! after another because each request needs the previous cursor.

pub mod actions;
pub mod api;
pub mod credentials;
pub mod error;
pub mod models;
pub mod resolve;
pub mod sync;

#[cfg(test)]
mod testing;

pub use actions::{ActionHandler, PushContent, UploadTicket, parse_count};
pub use api::{Classification, Endpoint, PushClient, Transport, UreqTransport, classify};
pub use credentials::Credentials;
pub use error::{PushError, Result};
pub use models::{Collection, Iden, Item, Watermark};
pub use resolve::{Target, resolve_device, resolve_target};
pub use sync::{
    ConfigWatermarkStore, InMemoryWatermarkStore, SyncKind, SyncOptions, SyncReport, SyncTracker,
    WatermarkStore, sync_since,
};
