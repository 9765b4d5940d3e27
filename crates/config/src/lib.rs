//! Configuration loading for the Pushbullet CLI
//!
//! Settings live in a shell-style key-value file in the shared config
//! directory (~/.config/pushbullet/config), one `KEY=value` pair per line.
//! Lines that are not pairs (comments, blanks) are kept verbatim so that a
//! rewrite only touches the keys that changed.
//!
//! Call [`init`] at application startup to bootstrap the config directory.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Default config filename inside the config directory
pub const CONFIG_FILE: &str = "config";

/// Environment variable overriding the config file location
pub const CONFIG_FILE_ENV: &str = "PB_CONFIG";

/// Initialize the config directory.
///
/// Creates ~/.config/pushbullet/ if it doesn't exist.
/// Call this once at application startup.
pub fn init() -> Result<PathBuf> {
    ensure_config_dir()
}

/// Get the config directory (~/.config/pushbullet/)
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("pushbullet"))
}

/// Get the path to a file within the config directory
pub fn config_path(filename: &str) -> Option<PathBuf> {
    config_dir().map(|p| p.join(filename))
}

/// Resolve the config file, honoring `PB_CONFIG` when set
pub fn config_file() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_FILE_ENV) {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => config_path(CONFIG_FILE),
    }
}

/// Ensure the config directory exists
pub fn ensure_config_dir() -> Result<PathBuf> {
    let dir = config_dir().context("Could not determine config directory")?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    Ok(dir)
}

#[derive(Debug, Clone, PartialEq)]
enum Line {
    Pair { key: String, value: String },
    Verbatim(String),
}

/// A `KEY=value` config file loaded into memory
#[derive(Debug, Clone)]
pub struct KeyValueFile {
    path: PathBuf,
    lines: Vec<Line>,
}

impl KeyValueFile {
    /// Load the file at `path`. A missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config file: {}", path.display()));
            }
        };
        Ok(Self::parse(path, &content))
    }

    /// Parse file content without touching the filesystem
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Self {
        let lines = content.lines().map(parse_line).collect();
        Self {
            path: path.into(),
            lines,
        }
    }

    /// Get the value for `key`. The last assignment wins, as in a shell.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().rev().find_map(|line| match line {
            Line::Pair { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Set `key`, replacing an existing assignment in place or appending one
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(Line::Pair { value: v, .. }) = self
            .lines
            .iter_mut()
            .rev()
            .find(|line| matches!(line, Line::Pair { key: k, .. } if k == key))
        {
            *v = value;
            return;
        }

        self.lines.push(Line::Pair {
            key: key.to_string(),
            value,
        });
    }

    /// Render the file content
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Pair { key, value } => {
                    out.push_str(key);
                    out.push('=');
                    out.push_str(&quote(value));
                }
                Line::Verbatim(text) => out.push_str(text),
            }
            out.push('\n');
        }
        out
    }

    /// Write the file back, creating its parent directory if needed
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.path, self.render())
            .with_context(|| format!("Failed to write config file: {}", self.path.display()))
    }
}

fn parse_line(raw: &str) -> Line {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Line::Verbatim(raw.to_string());
    }

    let assignment = trimmed.strip_prefix("export ").unwrap_or(trimmed);
    match assignment.split_once('=') {
        Some((key, value)) if is_valid_key(key.trim()) => Line::Pair {
            key: key.trim().to_string(),
            value: unquote(value.trim()).to_string(),
        },
        _ => Line::Verbatim(raw.to_string()),
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn unquote(value: &str) -> &str {
    for q in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(q) && value.ends_with(q) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn quote(value: &str) -> String {
    if value.chars().any(|c| c.is_whitespace() || c == '#') {
        format!("\"{}\"", value)
    } else {
        value.to_string()
    }
}
