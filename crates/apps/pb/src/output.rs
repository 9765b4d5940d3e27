//! Terminal output for listings and action results

use anyhow::Result;
use chrono::{DateTime, Local};
use pushbullet::{Collection, Item};
use serde_json::{Map, Value};

/// Renders results as text or JSON
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print titled listings
    ///
    /// JSON mode emits one object keyed by the lowercased headings.
    pub fn listings(&self, sections: &[(&str, &Collection)]) -> Result<()> {
        if self.json {
            println!("{}", listings_json(sections)?);
            return Ok(());
        }

        for (heading, collection) in sections {
            println!("{}:", heading);
            if collection.is_empty() {
                println!("  (none)");
            }
            for item in collection.iter() {
                println!("  {}", describe(item));
            }
        }
        Ok(())
    }

    /// Print the pushes of a sync, newest first
    pub fn pushes(&self, collection: &Collection, limit: Option<usize>) -> Result<()> {
        let items: Vec<&Item> = collection
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .collect();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&items)?);
            return Ok(());
        }

        if items.is_empty() {
            println!("No new pushes.");
        }
        for push in items {
            println!("{}", render_push(push));
        }
        Ok(())
    }

    /// Print a single item (a push that was just sent)
    pub fn item(&self, item: &Item) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(item)?);
        } else {
            println!("Sent {} {}", item.kind, item.iden);
        }
        Ok(())
    }

    pub fn message(&self, text: &str) {
        if !self.json {
            println!("{}", text);
        }
    }
}

fn listings_json(sections: &[(&str, &Collection)]) -> serde_json::Result<String> {
    let mut document = Map::new();
    for (heading, collection) in sections {
        document.insert(heading.to_lowercase(), serde_json::to_value(&collection.items)?);
    }
    serde_json::to_string_pretty(&Value::Object(document))
}

/// One line for a device, contact or subscription
fn describe(item: &Item) -> String {
    let name = item.display_name();
    match (item.contact_email(), item.subscribed_channel()) {
        (Some(email), _) if email != name => format!("{} <{}>", name, email),
        (_, Some(tag)) => format!("{} (#{})", name, tag),
        _ => name,
    }
}

fn render_push(push: &Item) -> String {
    let when = push
        .created
        .and_then(|secs| DateTime::from_timestamp(secs.floor() as i64, 0))
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut lines = vec![format!("[{}] {} ({})", when, push.kind, push.iden)];
    for text in [&push.title, &push.url, &push.file_name, &push.body]
        .into_iter()
        .flatten()
    {
        lines.push(format!("    {}", text));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_chat_with_email() {
        let chat: Item = serde_json::from_str(
            r#"{"iden": "c1", "with": {"name": "Ann", "email": "ann@example.com"}}"#,
        )
        .unwrap();
        assert_eq!(describe(&chat), "Ann <ann@example.com>");
    }

    #[test]
    fn test_render_push_lists_fields() {
        let mut push = Item::new("p1", "link");
        push.title = Some("Docs".into());
        push.url = Some("https://docs.rs".into());
        let text = render_push(&push);
        assert!(text.starts_with("[-] link (p1)"));
        assert!(text.contains("    Docs\n    https://docs.rs"));
    }

    #[test]
    fn test_listings_json_is_one_document() {
        let devices = Collection::new(vec![Item::new("d1", "device")]);
        let contacts = Collection::default();
        let json = listings_json(&[("Devices", &devices), ("Contacts", &contacts)]).unwrap();

        let document: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(document["devices"][0]["iden"], "d1");
        assert_eq!(document["contacts"], Value::Array(vec![]));
    }
}
