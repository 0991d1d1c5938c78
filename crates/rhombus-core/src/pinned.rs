//! Pinned panel shortcuts and their persistence.
//!
//! The on-disk format is TOML:
//!
//! ```toml
//! [[app]]
//! name = "Firefox"
//! command = "firefox"
//! icon = ""
//! ```
//!
//! Files ending in `.conf` use the older line format `name|command|icon`
//! instead, read and written as-is.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::client::ClientId;

#[derive(Debug, Error)]
pub enum PinnedError {
    #[error("Failed to access pinned apps file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse pinned apps file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize pinned apps: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Stable identifier of a pinned record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinnedId(pub u64);

/// A pinned shortcut.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedApp {
    pub id: PinnedId,
    pub name: String,
    pub command: Option<String>,
    pub icon: Option<String>,
    /// The live client this record was pinned from, if still around.
    pub client: Option<ClientId>,
}

impl PinnedApp {
    /// Placeholder glyph drawn on the panel icon.
    pub fn initial(&self) -> char {
        self.name
            .chars()
            .next()
            .map_or('?', |c| c.to_ascii_uppercase())
    }
}

/// One persisted record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinnedRecord {
    pub name: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PinnedFile {
    #[serde(default, rename = "app")]
    apps: Vec<PinnedRecord>,
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// The ordered pinned-app list shown on the panel.
#[derive(Debug, Clone, Default)]
pub struct PinnedApps {
    apps: Vec<PinnedApp>,
    next_id: u64,
}

impl PinnedApps {
    pub fn from_records(records: Vec<PinnedRecord>) -> Self {
        let mut pinned = Self::default();
        for r in records {
            pinned.push(&r.name, non_empty(&r.command), non_empty(&r.icon), None);
        }
        pinned
    }

    pub fn push(
        &mut self,
        name: &str,
        command: Option<String>,
        icon: Option<String>,
        client: Option<ClientId>,
    ) -> PinnedId {
        self.next_id += 1;
        let id = PinnedId(self.next_id);
        self.apps.push(PinnedApp {
            id,
            name: name.to_string(),
            command,
            icon,
            client,
        });
        id
    }

    /// Pin a live client by its title. Returns `None` if it is already pinned.
    pub fn pin_client(&mut self, client: ClientId, title: &str) -> Option<PinnedId> {
        if self.is_linked(client) {
            return None;
        }
        Some(self.push(title, None, None, Some(client)))
    }

    pub fn unpin(&mut self, id: PinnedId) -> Option<PinnedApp> {
        let pos = self.apps.iter().position(|a| a.id == id)?;
        Some(self.apps.remove(pos))
    }

    pub fn get(&self, id: PinnedId) -> Option<&PinnedApp> {
        self.apps.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PinnedApp> {
        self.apps.iter()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    /// Whether a pinned record stands in for this client on the panel.
    pub fn is_linked(&self, client: ClientId) -> bool {
        self.apps.iter().any(|a| a.client == Some(client))
    }

    /// Drop links to a client that went away; records become launch-only.
    pub fn unlink(&mut self, client: ClientId) {
        for app in &mut self.apps {
            if app.client == Some(client) {
                app.client = None;
            }
        }
    }

    pub fn to_records(&self) -> Vec<PinnedRecord> {
        self.apps
            .iter()
            .map(|a| PinnedRecord {
                name: a.name.clone(),
                command: a.command.clone().unwrap_or_default(),
                icon: a.icon.clone().unwrap_or_default(),
            })
            .collect()
    }
}

fn is_legacy(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "conf")
}

/// Parse the `name|command|icon` line format. Records without a name are skipped.
pub fn parse_legacy(text: &str) -> Vec<PinnedRecord> {
    text.lines()
        .filter_map(|line| {
            let mut fields = line.splitn(3, '|');
            let name = fields.next()?.trim();
            if name.is_empty() {
                return None;
            }
            Some(PinnedRecord {
                name: name.to_string(),
                command: fields.next().unwrap_or_default().trim().to_string(),
                icon: fields.next().unwrap_or_default().trim().to_string(),
            })
        })
        .collect()
}

pub fn format_legacy(records: &[PinnedRecord]) -> String {
    records
        .iter()
        .map(|r| format!("{}|{}|{}\n", r.name, r.command, r.icon))
        .collect()
}

/// Load records from `path`; a missing file is an empty list.
pub fn load(path: &Path) -> Result<Vec<PinnedRecord>, PinnedError> {
    if !path.exists() {
        debug!("No pinned apps file at {:?}", path);
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path)?;
    if is_legacy(path) {
        return Ok(parse_legacy(&text));
    }
    let file: PinnedFile = toml::from_str(&text)?;
    Ok(file
        .apps
        .into_iter()
        .filter(|r| !r.name.trim().is_empty())
        .collect())
}

/// Write `pinned` to `path`, creating the parent directory if needed.
pub fn save(path: &Path, pinned: &PinnedApps) -> Result<(), PinnedError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let records = pinned.to_records();
    let text = if is_legacy(path) {
        format_legacy(&records)
    } else {
        toml::to_string_pretty(&PinnedFile { apps: records })?
    };
    fs::write(path, text)?;
    Ok(())
}
