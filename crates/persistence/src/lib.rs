#![deny(warnings)]

//! Slot-based save files and the player profile, stored under one directory.
//!
//! Each slot is a single file named `<slot>.json` or `<slot>.bin`. Writes go
//! to a sibling temp file first and are renamed into place, so a crash never
//! leaves a truncated save behind.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use throne_core::{Profile, SaveData};
use tracing::{debug, info};

const PROFILE_FILE: &str = "profile.json";

/// On-disk encoding of a save slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveFormat {
    Json,
    Binary,
}

impl SaveFormat {
    pub fn extension(self) -> &'static str {
        match self {
            SaveFormat::Json => "json",
            SaveFormat::Binary => "bin",
        }
    }

    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(SaveFormat::Json),
            "bin" => Some(SaveFormat::Binary),
            _ => None,
        }
    }
}

/// Listing entry for one save slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotInfo {
    pub slot: String,
    pub format: SaveFormat,
    pub turn: u32,
    pub timestamp: DateTime<Utc>,
}

/// Save slots and the profile under a root directory.
#[derive(Clone, Debug)]
pub struct SaveStore {
    root: PathBuf,
}

impl SaveStore {
    /// Open (and create if missing) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("creating save directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, slot: &str, format: SaveFormat) -> Result<PathBuf> {
        if slot.is_empty()
            || slot == PROFILE_FILE.trim_end_matches(".json")
            || !slot
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            bail!("invalid slot name {slot:?}");
        }
        Ok(self.root.join(format!("{slot}.{}", format.extension())))
    }

    /// Write `data` to `slot`, replacing any save in that slot in either format.
    pub fn save(&self, slot: &str, data: &SaveData, format: SaveFormat) -> Result<PathBuf> {
        let path = self.slot_path(slot, format)?;
        let bytes = encode(data, format)?;
        write_atomic(&path, &bytes)?;
        let other = match format {
            SaveFormat::Json => SaveFormat::Binary,
            SaveFormat::Binary => SaveFormat::Json,
        };
        let stale = self.slot_path(slot, other)?;
        if stale.exists() {
            fs::remove_file(&stale)
                .with_context(|| format!("removing stale save {}", stale.display()))?;
        }
        info!(slot, turn = data.turn, path = %path.display(), "game saved");
        Ok(path)
    }

    /// Read the save in `slot`, whichever format it was written in.
    pub fn load(&self, slot: &str) -> Result<SaveData> {
        for format in [SaveFormat::Json, SaveFormat::Binary] {
            let path = self.slot_path(slot, format)?;
            if path.exists() {
                let bytes =
                    fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
                let data: SaveData = decode(&bytes, format)
                    .with_context(|| format!("decoding save {}", path.display()))?;
                debug!(slot, turn = data.turn, "game loaded");
                return Ok(data);
            }
        }
        bail!("no save in slot {slot:?}")
    }

    /// Every readable save, sorted by slot name. Files that fail to decode are skipped.
    pub fn list(&self) -> Result<Vec<SlotInfo>> {
        let mut out = Vec::new();
        let entries = fs::read_dir(&self.root)
            .with_context(|| format!("listing {}", self.root.display()))?;
        for entry in entries {
            let path = entry?.path();
            let Some(format) = SaveFormat::from_path(&path) else {
                continue;
            };
            let Some(slot) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if path.file_name().and_then(|n| n.to_str()) == Some(PROFILE_FILE) {
                continue;
            }
            let decoded = fs::read(&path)
                .map_err(anyhow::Error::from)
                .and_then(|b| decode::<SaveData>(&b, format));
            match decoded {
                Ok(data) => out.push(SlotInfo {
                    slot: slot.to_string(),
                    format,
                    turn: data.turn,
                    timestamp: data.timestamp,
                }),
                Err(e) => debug!(path = %path.display(), error = %e, "skipping unreadable save"),
            }
        }
        out.sort_by(|a, b| a.slot.cmp(&b.slot));
        Ok(out)
    }

    /// Remove `slot`. Returns false when there was nothing to delete.
    pub fn delete(&self, slot: &str) -> Result<bool> {
        let mut removed = false;
        for format in [SaveFormat::Json, SaveFormat::Binary] {
            let path = self.slot_path(slot, format)?;
            if path.exists() {
                fs::remove_file(&path)
                    .with_context(|| format!("deleting {}", path.display()))?;
                removed = true;
            }
        }
        if removed {
            info!(slot, "save deleted");
        }
        Ok(removed)
    }

    pub fn save_profile(&self, profile: &Profile) -> Result<()> {
        let bytes = encode(profile, SaveFormat::Json)?;
        write_atomic(&self.root.join(PROFILE_FILE), &bytes)
    }

    /// Stored profile, or a fresh one if none was saved yet.
    pub fn load_profile(&self) -> Result<Profile> {
        let path = self.root.join(PROFILE_FILE);
        if !path.exists() {
            return Ok(Profile::default());
        }
        let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        decode(&bytes, SaveFormat::Json).with_context(|| format!("decoding {}", path.display()))
    }
}

fn encode<T: Serialize>(value: &T, format: SaveFormat) -> Result<Vec<u8>> {
    Ok(match format {
        SaveFormat::Json => serde_json::to_vec_pretty(value)?,
        SaveFormat::Binary => bincode::serialize(value)?,
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8], format: SaveFormat) -> Result<T> {
    Ok(match format {
        SaveFormat::Json => serde_json::from_slice(bytes)?,
        SaveFormat::Binary => bincode::deserialize(bytes)?,
    })
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("moving {} into place", path.display()))?;
    Ok(())
}
