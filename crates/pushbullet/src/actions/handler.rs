//! Action handler for Pushbullet operations
//!
//! Coordinates the fetcher, the resolver and single API calls. Every call
//! goes through classification, so failures surface as typed errors.

use log::{debug, info};
use mime_guess::from_path;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::path::Path;

use crate::api::{Body, Endpoint, Method, PushClient, Request, Transport};
use crate::error::{PushError, Result};
use crate::models::{Collection, Iden, Item};
use crate::resolve::{Target, is_email_target, resolve_device, resolve_target};

/// Package that relays SMS replies on Android
const SMS_PACKAGE: &str = "com.pushbullet.android";

/// Content of a push
#[derive(Debug, Clone, PartialEq)]
pub enum PushContent {
    Note {
        title: String,
        body: Option<String>,
    },
    Link {
        title: String,
        url: String,
        body: Option<String>,
    },
    File {
        path: std::path::PathBuf,
        body: Option<String>,
    },
}

/// Response of an upload request
#[derive(Debug, Clone, Deserialize)]
pub struct UploadTicket {
    pub file_name: String,
    pub file_type: String,
    pub file_url: String,
    pub upload_url: String,
}

#[derive(Debug, Deserialize)]
struct User {
    iden: Iden,
}

/// Parse a user-supplied count
pub fn parse_count(input: &str) -> Result<usize> {
    input
        .trim()
        .parse()
        .map_err(|_| PushError::malformed(format!("'{}' is not a valid count", input)))
}

/// Handler for user actions against the API
pub struct ActionHandler<'a, T: Transport> {
    client: &'a PushClient<T>,
}

impl<'a, T: Transport> ActionHandler<'a, T> {
    pub fn new(client: &'a PushClient<T>) -> Self {
        Self { client }
    }

    /// Active devices
    pub fn devices(&self) -> Result<Collection> {
        self.client
            .fetch_all(&Endpoint::Devices, &[("active", "true")])
    }

    /// Active contacts (chats)
    pub fn contacts(&self) -> Result<Collection> {
        self.client.fetch_all(&Endpoint::Chats, &[("active", "true")])
    }

    /// Active channel subscriptions
    pub fn subscriptions(&self) -> Result<Collection> {
        self.client
            .fetch_all(&Endpoint::Subscriptions, &[("active", "true")])
    }

    /// All active pushes, newest first
    pub fn active_pushes(&self) -> Result<Collection> {
        self.client.fetch_all(&Endpoint::Pushes, &[("active", "true")])
    }

    /// Resolve `query` to a target, treating unknown device names as
    /// channel tags
    ///
    /// Devices are only listed when the query could name one.
    pub fn resolve_push_target(&self, query: &str) -> Result<Target> {
        let query = query.trim();
        let needs_devices =
            !query.is_empty() && !query.eq_ignore_ascii_case("all") && !is_email_target(query);
        let devices = if needs_devices {
            self.devices()?
        } else {
            Collection::default()
        };

        match resolve_target(&devices, query) {
            Err(PushError::NoSuchDevice { query }) => {
                debug!("'{}' is not a device, using it as a channel tag", query);
                Ok(Target::Channel(query))
            }
            other => other,
        }
    }

    /// Send a push to `target`
    pub fn push(&self, target: &Target, content: &PushContent) -> Result<Item> {
        let mut payload = match content {
            PushContent::Note { title, body } => note_payload(title, body.as_deref()),
            PushContent::Link { title, url, body } => link_payload(title, url, body.as_deref())?,
            PushContent::File { path, body } => self.file_payload(path, body.as_deref())?,
        };
        add_target(&mut payload, target);

        let pushed: Item = self.client.call_as(
            &Endpoint::Pushes,
            &Request::post(&Endpoint::Pushes, Value::Object(payload)),
        )?;
        info!("Pushed {} {} to {:?}", pushed.kind, pushed.iden, target);
        Ok(pushed)
    }

    /// Upload a local file, returning where it can be downloaded
    pub fn upload(&self, path: &Path) -> Result<UploadTicket> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| PushError::malformed(format!("{}: {}", path.display(), e)))?;
        if metadata.is_dir() {
            return Err(PushError::malformed(format!(
                "{} is a directory; only regular files can be pushed",
                path.display()
            )));
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PushError::malformed(format!("{} has no file name", path.display())))?;
        let file_type = guess_mime_type(path);

        let ticket: UploadTicket = self.client.call_as(
            &Endpoint::UploadRequest,
            &Request::post(
                &Endpoint::UploadRequest,
                json!({ "file_name": file_name, "file_type": file_type }),
            ),
        )?;

        let data = std::fs::read(path).map_err(|e| {
            PushError::Local(anyhow::Error::new(e).context(format!("Failed to read {}", path.display())))
        })?;
        let request = Request::absolute(Method::Post, ticket.upload_url.as_str()).with_body(
            Body::multipart_file("file", &ticket.file_name, &ticket.file_type, &data),
        );
        self.client.send_raw(&request)?;

        info!("Uploaded {} ({} bytes)", ticket.file_name, data.len());
        Ok(ticket)
    }

    fn file_payload(&self, path: &Path, body: Option<&str>) -> Result<Map<String, Value>> {
        let ticket = self.upload(path)?;
        let mut payload = Map::new();
        payload.insert("type".into(), json!("file"));
        payload.insert("file_name".into(), json!(ticket.file_name));
        payload.insert("file_type".into(), json!(ticket.file_type));
        payload.insert("file_url".into(), json!(ticket.file_url));
        if let Some(body) = body {
            payload.insert("body".into(), json!(body));
        }
        Ok(payload)
    }

    /// Delete one push
    pub fn delete_push(&self, iden: &Iden) -> Result<()> {
        let endpoint = Endpoint::Push(iden.clone());
        self.client.call(&endpoint, &Request::delete(&endpoint))?;
        info!("Deleted push {}", iden);
        Ok(())
    }

    /// Delete every push
    pub fn delete_all(&self) -> Result<()> {
        self.client
            .call(&Endpoint::Pushes, &Request::delete(&Endpoint::Pushes))?;
        info!("Deleted all pushes");
        Ok(())
    }

    /// Delete all active pushes except the `keep` most recently created
    ///
    /// Returns the number of pushes deleted.
    pub fn delete_except(&self, keep: usize) -> Result<usize> {
        let mut pushes = self.active_pushes()?.items;
        pushes.sort_by(|a, b| {
            b.created
                .unwrap_or(0.0)
                .total_cmp(&a.created.unwrap_or(0.0))
        });

        let doomed = pushes.split_off(keep.min(pushes.len()));
        for push in &doomed {
            self.delete_push(&push.iden)?;
        }
        Ok(doomed.len())
    }

    /// Send an SMS through an Android device
    pub fn send_sms(&self, device_query: &str, number: &str, message: &str) -> Result<()> {
        if number.trim().is_empty() {
            return Err(PushError::malformed("empty phone number"));
        }

        let devices = self.devices()?;
        let (device_iden, device_name) = resolve_device(&devices, device_query)?;
        let user: User = self
            .client
            .call_as(&Endpoint::Me, &Request::get(&Endpoint::Me))?;

        let payload = json!({
            "type": "push",
            "push": {
                "type": "messaging_extension_reply",
                "package_name": SMS_PACKAGE,
                "source_user_iden": user.iden,
                "target_device_iden": device_iden,
                "conversation_iden": number.trim(),
                "message": message,
            }
        });
        self.client.call(
            &Endpoint::Ephemerals,
            &Request::post(&Endpoint::Ephemerals, payload),
        )?;

        info!("Sent SMS to {} via {}", number.trim(), device_name);
        Ok(())
    }
}

fn note_payload(title: &str, body: Option<&str>) -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("type".into(), json!("note"));
    payload.insert("title".into(), json!(title));
    if let Some(body) = body {
        payload.insert("body".into(), json!(body));
    }
    payload
}

fn link_payload(title: &str, url: &str, body: Option<&str>) -> Result<Map<String, Value>> {
    let parsed = url::Url::parse(url)
        .map_err(|e| PushError::malformed(format!("'{}' is not a valid URL: {}", url, e)))?;
    if parsed.cannot_be_a_base() {
        return Err(PushError::malformed(format!("'{}' is not a valid URL", url)));
    }

    let mut payload = note_payload(title, body);
    payload.insert("type".into(), json!("link"));
    payload.insert("url".into(), json!(url));
    Ok(payload)
}

fn add_target(payload: &mut Map<String, Value>, target: &Target) {
    match target {
        Target::Broadcast => {}
        Target::Device { iden, .. } => {
            payload.insert("device_iden".into(), json!(iden));
        }
        Target::Email(email) => {
            payload.insert("email".into(), json!(email));
        }
        Target::Channel(tag) => {
            payload.insert("channel_tag".into(), json!(tag));
        }
    }
}

fn guess_mime_type(path: &Path) -> String {
    from_path(path).first_or_octet_stream().essence_str().to_string()
}
