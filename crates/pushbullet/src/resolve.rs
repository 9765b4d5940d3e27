//! Device and contact resolution
//!
//! Maps a short user query onto exactly one push target. Resolution never
//! guesses: several matching devices is an error, not a pick.

use crate::error::{PushError, Result};
use crate::models::{Collection, Iden, Item};

/// Where a push is delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Every device of the account
    Broadcast,
    Device { iden: Iden, name: String },
    Email(String),
    Channel(String),
}

/// An active device whose name matched a query
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub item: &'a Item,
    pub name: String,
}

/// Queries containing `@` address a contact, not a device
pub fn is_email_target(query: &str) -> bool {
    query.contains('@')
}

/// Active devices whose name contains `query`, ignoring case
///
/// Only the nickname (or "manufacturer model") is matched; a device with
/// neither never matches.
pub fn candidates<'a>(devices: &'a Collection, query: &str) -> Vec<Candidate<'a>> {
    let needle = query.to_lowercase();
    devices
        .active()
        .filter_map(|item| {
            item.device_name().map(|name| Candidate { item, name })
        })
        .filter(|candidate| candidate.name.to_lowercase().contains(&needle))
        .collect()
}

/// Resolve `query` to a single active device
///
/// Fails with `NoSuchDevice` when nothing matches and `AmbiguousQuery`
/// when more than one device does.
pub fn resolve_device(devices: &Collection, query: &str) -> Result<(Iden, String)> {
    let mut matches = candidates(devices, query);
    match matches.len() {
        0 => Err(PushError::NoSuchDevice {
            query: query.to_string(),
        }),
        1 => {
            let Candidate { item, name } = matches.remove(0);
            Ok((item.iden.clone(), name))
        }
        _ => Err(PushError::AmbiguousQuery {
            query: query.to_string(),
            matches: matches.into_iter().map(|c| c.name).collect(),
        }),
    }
}

/// Resolve a push target: `all`, an email address, or a device query
///
/// A query that names no device yields `NoSuchDevice`; whether that means
/// a channel tag is up to the caller.
pub fn resolve_target(devices: &Collection, query: &str) -> Result<Target> {
    let query = query.trim();
    if query.is_empty() {
        return Err(PushError::malformed("empty push target"));
    }
    if query.eq_ignore_ascii_case("all") {
        return Ok(Target::Broadcast);
    }
    if is_email_target(query) {
        return Ok(Target::Email(query.to_string()));
    }

    let (iden, name) = resolve_device(devices, query)?;
    Ok(Target::Device { iden, name })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(iden: &str, nickname: &str, active: bool) -> Item {
        let mut item = Item::new(iden, "device");
        item.nickname = Some(nickname.to_string());
        item.active = Some(active);
        item
    }

    fn office_devices() -> Collection {
        Collection::new(vec![
            device("pc1", "Office-PC", true),
            device("lap1", "Office-Laptop", true),
        ])
    }

    #[test]
    fn test_ambiguous_query() {
        match resolve_device(&office_devices(), "office") {
            Err(PushError::AmbiguousQuery { matches, .. }) => {
                assert_eq!(matches, vec!["Office-PC", "Office-Laptop"]);
            }
            other => panic!("expected ambiguous query, got {:?}", other),
        }
    }

    #[test]
    fn test_unique_match_is_case_insensitive() {
        let (iden, name) = resolve_device(&office_devices(), "laptop").unwrap();
        assert_eq!(iden.as_str(), "lap1");
        assert_eq!(name, "Office-Laptop");
    }

    #[test]
    fn test_no_match() {
        assert!(matches!(
            resolve_device(&office_devices(), "phone"),
            Err(PushError::NoSuchDevice { .. })
        ));
    }

    #[test]
    fn test_email_bypasses_devices() {
        let mut devices = office_devices();
        devices.items.push(device("odd", "a@b.com", true));
        assert_eq!(
            resolve_target(&devices, "a@b.com").unwrap(),
            Target::Email("a@b.com".to_string())
        );
    }

    #[test]
    fn test_inactive_devices_are_ignored() {
        let devices = Collection::new(vec![
            device("old", "Office-PC", false),
            device("new", "Office-PC", true),
        ]);
        let (iden, _) = resolve_device(&devices, "office").unwrap();
        assert_eq!(iden.as_str(), "new");
    }

    #[test]
    fn test_unnamed_device_does_not_match_its_iden() {
        let devices = Collection::new(vec![
            Item::new("ujpah72o0sjAoRtnM0jc", "device"),
            device("pc1", "Office-PC", true),
        ]);
        assert!(matches!(
            resolve_device(&devices, "ujpah"),
            Err(PushError::NoSuchDevice { .. })
        ));
        assert_eq!(resolve_device(&devices, "pc").unwrap().0.as_str(), "pc1");
    }

    #[test]
    fn test_hardware_name_matches_without_nickname() {
        let pixel: Item =
            serde_json::from_str(r#"{"iden": "g1", "manufacturer": "Google", "model": "Pixel 8"}"#)
                .unwrap();
        let devices = Collection::new(vec![pixel]);
        let (iden, name) = resolve_device(&devices, "pixel").unwrap();
        assert_eq!(iden.as_str(), "g1");
        assert_eq!(name, "Google Pixel 8");
    }

    #[test]
    fn test_all_and_empty_targets() {
        assert_eq!(resolve_target(&office_devices(), "all").unwrap(), Target::Broadcast);
        assert!(matches!(
            resolve_target(&office_devices(), "  "),
            Err(PushError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_device_target() {
        assert_eq!(
            resolve_target(&office_devices(), "PC").unwrap(),
            Target::Device {
                iden: Iden::new("pc1"),
                name: "Office-PC".to_string()
            }
        );
    }
}
