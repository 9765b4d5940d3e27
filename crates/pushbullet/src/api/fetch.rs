//! Paginated fetcher
//!
//! Turns a cursor-based listing endpoint into one complete collection.
//! Pages are fetched strictly in sequence since each request needs the
//! cursor returned by the previous one.

use log::{debug, warn};
use serde_json::Value;

use super::{Endpoint, Exchange, PushClient, Request, Transport, classify};
use crate::error::Result;
use crate::models::{Collection, Item};

impl<T: Transport> PushClient<T> {
    /// Fetch every page of `endpoint`
    ///
    /// `params` are sent unchanged with every request. Any aborting page
    /// fails the whole fetch; items gathered so far are dropped.
    pub fn fetch_all(&self, endpoint: &Endpoint, params: &[(&str, &str)]) -> Result<Collection> {
        self.fetch_from(endpoint, params, None)
    }

    /// Fetch every page of `endpoint`, starting at `cursor`
    pub fn fetch_from(
        &self,
        endpoint: &Endpoint,
        params: &[(&str, &str)],
        cursor: Option<String>,
    ) -> Result<Collection> {
        let mut items = Vec::new();
        let mut cursor = cursor;
        let mut pages = 0usize;

        loop {
            let request = page_request(endpoint, params, cursor.as_deref());
            let exchange = Exchange::from(self.transport().execute(&request));
            let next = classify(endpoint, &exchange).into_result()?;

            pages += 1;
            let page_items = extract_items(endpoint, &exchange.body);
            debug!(
                "{} page {}: {} items, {}",
                endpoint.path(),
                pages,
                page_items.len(),
                if next.is_some() { "more to fetch" } else { "done" }
            );
            items.extend(page_items);

            match next {
                Some(next_cursor) => cursor = Some(next_cursor),
                None => break,
            }
        }

        Ok(Collection::new(items))
    }
}

fn page_request(endpoint: &Endpoint, params: &[(&str, &str)], cursor: Option<&str>) -> Request {
    let mut request = Request::get(endpoint);
    for (key, value) in params {
        request = request.with_param(*key, *value);
    }
    if let Some(cursor) = cursor {
        request = request.with_param("cursor", cursor);
    }
    request
}

/// Items listed under the endpoint's collection key
///
/// Records that cannot be read as an item (no `iden`) are skipped.
fn extract_items(endpoint: &Endpoint, body: &str) -> Vec<Item> {
    let Some(key) = endpoint.collection_key() else {
        return Vec::new();
    };
    let Ok(Value::Object(mut page)) = serde_json::from_str::<Value>(body) else {
        return Vec::new();
    };
    let Some(Value::Array(records)) = page.remove(key) else {
        return Vec::new();
    };

    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<Item>(record) {
            Ok(mut item) => {
                if item.kind.is_empty() {
                    item.kind = endpoint.item_kind().to_string();
                }
                Some(item)
            }
            Err(e) => {
                warn!("Skipping unreadable {} record: {}", endpoint.item_kind(), e);
                None
            }
        })
        .collect()
}
