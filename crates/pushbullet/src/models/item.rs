//! Item model shared by pushes, devices, chats and subscriptions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Unique identifier of a remote object (Pushbullet "iden")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Iden(pub String);

impl Iden {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Iden {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Iden {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for Iden {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A push, device, chat or subscription record
///
/// Only `iden` and the type tag are required. Fields this client does not
/// interpret are kept in `extra` and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub iden: Iden,
    /// Type tag (`note`, `link`, `file`, `device`, ...). Records without a
    /// `type` field get the tag of the collection they were listed from.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_tag: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    /// Create a bare item, mostly useful in tests
    pub fn new(iden: impl Into<Iden>, kind: impl Into<String>) -> Self {
        Self {
            iden: iden.into(),
            kind: kind.into(),
            active: None,
            created: None,
            modified: None,
            title: None,
            nickname: None,
            body: None,
            url: None,
            file_name: None,
            file_type: None,
            file_url: None,
            email: None,
            channel_tag: None,
            extra: Map::new(),
        }
    }

    /// Items without an `active` flag are considered active
    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }

    /// Contact email for chats (`with.email`) or contacts (`email`)
    pub fn contact_email(&self) -> Option<&str> {
        self.email.as_deref().or_else(|| self.nested("with", "email"))
    }

    /// Tag of the channel a subscription points at
    pub fn subscribed_channel(&self) -> Option<&str> {
        self.channel_tag
            .as_deref()
            .or_else(|| self.nested("channel", "tag"))
    }

    /// Human readable name used for listing and device matching
    ///
    /// Devices use their nickname, falling back to "manufacturer model".
    /// Chats use the contact name, subscriptions the channel name and
    /// pushes their title.
    pub fn display_name(&self) -> String {
        if let Some(nickname) = self.nickname.as_deref().filter(|s| !s.is_empty()) {
            return nickname.to_string();
        }
        if let Some(name) = self
            .nested("with", "name")
            .or_else(|| self.nested("channel", "name"))
            .or_else(|| self.extra_str("name"))
        {
            return name.to_string();
        }
        if let Some(title) = self.title.as_deref().filter(|s| !s.is_empty()) {
            return title.to_string();
        }

        if let Some(hardware) = self.hardware_name() {
            return hardware;
        }

        self.contact_email()
            .map(str::to_string)
            .unwrap_or_else(|| self.iden.to_string())
    }

    /// Name a device is addressed by: its nickname, else "manufacturer model"
    pub fn device_name(&self) -> Option<String> {
        self.nickname
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| self.hardware_name())
    }

    fn hardware_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.extra_str("manufacturer"), self.extra_str("model")]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    fn nested(&self, object: &str, key: &str) -> Option<&str> {
        self.extra
            .get(object)
            .and_then(|inner| inner.get(key))
            .and_then(Value::as_str)
    }
}

/// All items of one logical query, in server order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    pub items: Vec<Item>,
}

impl Collection {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    /// Items still marked active
    pub fn active(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| item.is_active())
    }

    /// Latest modification time by the recorded field, not by position
    pub fn max_modified(&self) -> Option<f64> {
        self.items
            .iter()
            .filter_map(|item| item.modified)
            .max_by(f64::total_cmp)
    }
}

impl IntoIterator for Collection {
    type Item = Item;
    type IntoIter = std::vec::IntoIter<Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Collection {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_preserves_unknown_fields() {
        let json = r#"{
            "iden": "ujpah72o0",
            "type": "note",
            "active": true,
            "modified": 1412047948.579031,
            "title": "Hello",
            "direction": "self",
            "sender_name": "Ryan"
        }"#;

        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.iden.as_str(), "ujpah72o0");
        assert_eq!(item.kind, "note");
        assert_eq!(item.modified, Some(1412047948.579031));
        assert_eq!(item.extra.get("direction").unwrap(), "self");

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["sender_name"], "Ryan");
        assert_eq!(back["type"], "note");
    }

    #[test]
    fn test_missing_active_means_active() {
        let item: Item = serde_json::from_str(r#"{"iden": "a"}"#).unwrap();
        assert!(item.is_active());
        assert_eq!(item.kind, "");
    }

    #[test]
    fn test_display_name_fallbacks() {
        let device: Item = serde_json::from_str(
            r#"{"iden": "d1", "manufacturer": "Google", "model": "Pixel 8"}"#,
        )
        .unwrap();
        assert_eq!(device.display_name(), "Google Pixel 8");

        let chat: Item = serde_json::from_str(
            r#"{"iden": "c1", "with": {"name": "Ann", "email": "ann@example.com"}}"#,
        )
        .unwrap();
        assert_eq!(chat.display_name(), "Ann");
        assert_eq!(chat.contact_email(), Some("ann@example.com"));

        let subscription: Item = serde_json::from_str(
            r#"{"iden": "s1", "channel": {"tag": "xkcd", "name": "xkcd comics"}}"#,
        )
        .unwrap();
        assert_eq!(subscription.display_name(), "xkcd comics");
        assert_eq!(subscription.subscribed_channel(), Some("xkcd"));

        let bare = Item::new("x1", "note");
        assert_eq!(bare.display_name(), "x1");
    }

    #[test]
    fn test_max_modified_ignores_position() {
        let mut a = Item::new("a", "note");
        a.modified = Some(1005.0);
        let mut b = Item::new("b", "note");
        b.modified = Some(1010.5);
        let c = Item::new("c", "note");

        let collection = Collection::new(vec![a, b, c]);
        assert_eq!(collection.max_modified(), Some(1010.5));
        assert_eq!(Collection::default().max_modified(), None);
    }
}
