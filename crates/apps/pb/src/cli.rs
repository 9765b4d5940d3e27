//! Command-line verbs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use pushbullet::{
    ActionHandler, ConfigWatermarkStore, Credentials, Iden, PushClient, PushContent, PushError,
    SyncKind, SyncOptions, SyncTracker, parse_count,
};
use std::io::{IsTerminal, Read};
use std::path::PathBuf;

use crate::output::Output;

/// Pushbullet from the command line
#[derive(Parser)]
#[command(name = "pb", version)]
pub struct Cli {
    /// Access token (defaults to PB_API_KEY, then the config file)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List devices, contacts and channel subscriptions
    List,

    /// Show pushes
    Pushes {
        /// `recent`: only pushes since the last check; `active`: all of them
        #[arg(value_enum)]
        mode: PushesMode,

        /// Show at most this many pushes
        count: Option<String>,
    },

    /// Send a note, link or file
    Push {
        /// Device name, email address, channel tag, or "all"
        target: String,

        #[arg(value_enum)]
        kind: PushKind,

        /// Title of a note or link, or the path of a file
        subject: String,

        /// Note: [body]. Link: <url> [body]. File: [message]
        #[arg(num_args = 0..=2)]
        rest: Vec<String>,
    },

    /// Delete a push by iden, "all" pushes, or all "except" the newest N
    Delete {
        what: String,

        /// Number of pushes to keep with "except"
        count: Option<String>,
    },

    /// Send an SMS through an Android device
    Sms {
        device: String,
        number: String,
        message: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PushesMode {
    Recent,
    Active,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PushKind {
    Note,
    Link,
    File,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let credentials = match self.api_key.as_deref().and_then(Credentials::from_token) {
            Some(creds) => creds,
            None => Credentials::load()?,
        };
        let client = PushClient::with_token(credentials.access_token);
        let handler = ActionHandler::new(&client);
        let output = Output::new(self.json);

        match self.command {
            Command::List => {
                let devices = handler.devices()?;
                let contacts = handler.contacts()?;
                let channels = handler.subscriptions()?;
                output.listings(&[
                    ("Devices", &devices),
                    ("Contacts", &contacts),
                    ("Channels", &channels),
                ])?;
            }
            Command::Pushes { mode, count } => {
                let limit = count.as_deref().map(parse_count).transpose()?;
                match mode {
                    PushesMode::Recent => {
                        let store = ConfigWatermarkStore::open_default()?;
                        let tracker = SyncTracker::new(store);
                        let report =
                            tracker.sync(&client, SyncKind::Pushes, &SyncOptions::default())?;
                        debug!(
                            "Sync took {}ms, watermark {} -> {}",
                            report.duration_ms, report.previous, report.watermark
                        );
                        output.pushes(&report.collection, limit)?;
                    }
                    PushesMode::Active => {
                        output.pushes(&handler.active_pushes()?, limit)?;
                    }
                }
            }
            Command::Push {
                target,
                kind,
                subject,
                rest,
            } => {
                let content = push_content(kind, subject, rest)?;
                let target = handler.resolve_push_target(&target)?;
                let pushed = handler.push(&target, &content)?;
                output.item(&pushed)?;
            }
            Command::Delete { what, count } => match (what.as_str(), count) {
                ("all", None) => {
                    handler.delete_all()?;
                    output.message("Deleted all pushes.");
                }
                ("except", Some(count)) => {
                    let deleted = handler.delete_except(parse_count(&count)?)?;
                    output.message(&format!("Deleted {} pushes.", deleted));
                }
                ("except", None) => {
                    return Err(PushError::MalformedInput(
                        "'delete except' needs the number of pushes to keep".into(),
                    )
                    .into());
                }
                (iden, None) => {
                    handler.delete_push(&Iden::new(iden))?;
                    output.message(&format!("Deleted push {}.", iden));
                }
                (_, Some(extra)) => {
                    return Err(PushError::MalformedInput(format!(
                        "unexpected argument '{}'",
                        extra
                    ))
                    .into());
                }
            },
            Command::Sms {
                device,
                number,
                message,
            } => {
                handler.send_sms(&device, &number, &message)?;
                output.message("SMS sent.");
            }
        }

        Ok(())
    }
}

/// Build push content from positional arguments
fn push_content(kind: PushKind, subject: String, rest: Vec<String>) -> Result<PushContent> {
    let mut rest = rest.into_iter();
    let content = match kind {
        PushKind::Note => PushContent::Note {
            title: subject,
            body: match rest.next() {
                Some(body) => Some(body),
                None => read_piped_stdin()?,
            },
        },
        PushKind::Link => PushContent::Link {
            title: subject,
            url: rest
                .next()
                .ok_or_else(|| PushError::MalformedInput("a link push needs a URL".into()))?,
            body: rest.next(),
        },
        PushKind::File => PushContent::File {
            path: PathBuf::from(subject),
            body: rest.next(),
        },
    };

    if let Some(extra) = rest.next() {
        return Err(PushError::MalformedInput(format!("unexpected argument '{}'", extra)).into());
    }
    Ok(content)
}

/// Note body piped on stdin, if any
fn read_piped_stdin() -> Result<Option<String>> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut body = String::new();
    stdin
        .lock()
        .read_to_string(&mut body)
        .context("Failed to read note body from stdin")?;
    let body = body.trim_end().to_string();
    Ok((!body.is_empty()).then_some(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_push() {
        let cli = Cli::try_parse_from(["pb", "push", "laptop", "link", "Docs", "https://docs.rs"])
            .unwrap();
        match cli.command {
            Command::Push {
                target, subject, rest, ..
            } => {
                assert_eq!(target, "laptop");
                assert_eq!(subject, "Docs");
                assert_eq!(rest, vec!["https://docs.rs"]);
            }
            _ => panic!("expected push command"),
        }
    }

    #[test]
    fn test_link_without_url_is_malformed() {
        let err = push_content(PushKind::Link, "Docs".into(), vec![]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PushError>(),
            Some(PushError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_file_content() {
        let content =
            push_content(PushKind::File, "a.png".into(), vec!["look".into()]).unwrap();
        assert_eq!(
            content,
            PushContent::File {
                path: PathBuf::from("a.png"),
                body: Some("look".into())
            }
        );
    }

    #[test]
    fn test_pushes_mode_parses() {
        let cli = Cli::try_parse_from(["pb", "pushes", "recent", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Pushes {
                mode: PushesMode::Recent,
                count: Some(_)
            }
        ));
    }
}
