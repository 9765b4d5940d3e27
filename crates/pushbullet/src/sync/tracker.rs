//! Incremental sync tracker

use log::{debug, info};
use std::time::Instant;

use super::WatermarkStore;
use crate::api::{Endpoint, PushClient, Transport};
use crate::error::Result;
use crate::models::{Collection, Watermark};

/// Listing that can be synced incrementally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    Pushes,
    Devices,
    Chats,
    Subscriptions,
}

impl SyncKind {
    pub fn endpoint(self) -> Endpoint {
        match self {
            SyncKind::Pushes => Endpoint::Pushes,
            SyncKind::Devices => Endpoint::Devices,
            SyncKind::Chats => Endpoint::Chats,
            SyncKind::Subscriptions => Endpoint::Subscriptions,
        }
    }
}

/// Options for a sync
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Only request items not deleted on the server
    pub active_only: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self { active_only: true }
    }
}

/// Result of a tracked sync
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Items modified after `previous`, in server order
    pub collection: Collection,
    /// Watermark the sync started from
    pub previous: Watermark,
    /// Watermark after the sync (equal to `previous` if nothing new)
    pub watermark: Watermark,
    /// Duration of the sync operation
    pub duration_ms: u64,
}

impl SyncReport {
    pub fn advanced(&self) -> bool {
        self.watermark > self.previous
    }
}

/// Fetch everything of `kind` modified after `watermark`
///
/// Returns the collection and the advanced watermark. Nothing is persisted.
pub fn sync_since<T: Transport>(
    client: &PushClient<T>,
    kind: SyncKind,
    watermark: Watermark,
    options: &SyncOptions,
) -> Result<(Collection, Watermark)> {
    let after = watermark.to_string();
    let mut params = vec![("modified_after", after.as_str())];
    if options.active_only {
        params.push(("active", "true"));
    }

    let collection = client.fetch_all(&kind.endpoint(), &params)?;
    let next = watermark.advanced_by(&collection);
    debug!(
        "Synced {:?} after {}: {} items, watermark {}",
        kind,
        watermark,
        collection.len(),
        next
    );
    Ok((collection, next))
}

/// Runs syncs against a persisted watermark
///
/// The watermark is loaded once per sync and saved only after the whole
/// fetch succeeded, so an interrupted or failed sync can simply be re-run.
pub struct SyncTracker<S: WatermarkStore> {
    store: S,
}

impl<S: WatermarkStore> SyncTracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Sync `kind` from the stored watermark and persist the new one
    pub fn sync<T: Transport>(
        &self,
        client: &PushClient<T>,
        kind: SyncKind,
        options: &SyncOptions,
    ) -> Result<SyncReport> {
        let start = Instant::now();
        let previous = self.store.load()?;

        let (collection, watermark) = sync_since(client, kind, previous, options)?;

        if watermark != previous {
            self.store.save(watermark)?;
            info!("Advanced {:?} watermark {} -> {}", kind, previous, watermark);
        }

        Ok(SyncReport {
            collection,
            previous,
            watermark,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PushError;
    use crate::sync::InMemoryWatermarkStore;
    use crate::testing::{FakeServer, ScriptedTransport, push};

    #[test]
    fn test_sync_since_sends_watermark_and_active() {
        let client = PushClient::new(FakeServer::new(10).with("pushes", push("a", 1005.0)));
        sync_since(&client, SyncKind::Pushes, Watermark::new(1000), &SyncOptions::default())
            .unwrap();

        let requests = client.transport().requests();
        assert_eq!(requests[0].param("modified_after"), Some("1000"));
        assert_eq!(requests[0].param("active"), Some("true"));
    }

    #[test]
    fn test_sync_since_without_active_filter() {
        let client = PushClient::new(FakeServer::new(10));
        let options = SyncOptions { active_only: false };
        sync_since(&client, SyncKind::Pushes, Watermark::ZERO, &options).unwrap();
        assert_eq!(client.transport().requests()[0].param("active"), None);
    }

    #[test]
    fn test_items_are_newer_than_watermark() {
        let server = FakeServer::new(2)
            .with("pushes", push("c", 1020.0))
            .with("pushes", push("b", 1010.0))
            .with("pushes", push("a", 990.0));
        let client = PushClient::new(server);

        let (collection, watermark) =
            sync_since(&client, SyncKind::Pushes, Watermark::new(1000), &SyncOptions::default())
                .unwrap();

        assert_eq!(collection.len(), 2);
        assert!(collection.iter().all(|i| i.modified.unwrap() > 1000.0));
        assert_eq!(watermark, Watermark::new(1020));
    }

    #[test]
    fn test_tracker_advances_and_is_stable() {
        let server = FakeServer::new(10)
            .with("pushes", push("b", 1010.0))
            .with("pushes", push("a", 1005.0));
        let client = PushClient::new(server);
        let tracker = SyncTracker::new(InMemoryWatermarkStore::new(Watermark::new(1000)));

        let first = tracker
            .sync(&client, SyncKind::Pushes, &SyncOptions::default())
            .unwrap();
        assert_eq!(first.collection.len(), 2);
        assert_eq!(first.watermark, Watermark::new(1010));
        assert!(first.advanced());

        let second = tracker
            .sync(&client, SyncKind::Pushes, &SyncOptions::default())
            .unwrap();
        assert!(second.collection.is_empty());
        assert_eq!(second.watermark, Watermark::new(1010));
        assert_eq!(tracker.store().save_count(), 1);
    }

    #[test]
    fn test_fractional_modified_is_not_redelivered() {
        let server = FakeServer::new(10).with("pushes", push("a", 1010.5));
        let client = PushClient::new(server);
        let tracker = SyncTracker::new(InMemoryWatermarkStore::new(Watermark::new(1000)));

        let first = tracker
            .sync(&client, SyncKind::Pushes, &SyncOptions::default())
            .unwrap();
        assert_eq!(first.collection.len(), 1);
        assert_eq!(first.watermark.to_string(), "1010.5");

        let second = tracker
            .sync(&client, SyncKind::Pushes, &SyncOptions::default())
            .unwrap();
        assert!(second.collection.is_empty());
        assert_eq!(
            client.transport().requests()[1].param("modified_after"),
            Some("1010.5")
        );
    }

    #[test]
    fn test_failed_sync_leaves_watermark() {
        let transport = ScriptedTransport::new()
            .respond(r#"{"pushes":[{"iden":"a","type":"note","created":1,"modified":2000}],"cursor":"c"}"#)
            .respond(r#"{"error":{"code":"invalid_access_token"},"error_code":"invalid_access_token"}"#);
        let client = PushClient::new(transport);
        let tracker = SyncTracker::new(InMemoryWatermarkStore::new(Watermark::new(1000)));

        let result = tracker.sync(&client, SyncKind::Pushes, &SyncOptions::default());
        assert!(matches!(result, Err(PushError::Auth)));
        assert_eq!(tracker.store().load().unwrap(), Watermark::new(1000));
        assert_eq!(tracker.store().save_count(), 0);
    }
}
