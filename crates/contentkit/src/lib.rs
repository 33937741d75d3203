#![deny(warnings)]

//! YAML content packs: loading, parsing and validation into a [`Catalog`].
//!
//! A pack directory contains:
//! - `pack.yaml` with [`PackMeta`]
//! - `characters.yaml` (optional)
//! - `cards/*.yaml`, read in file-name order
//! - `endings.yaml`
//! - `achievements.yaml` (optional)

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use throne_core::{Achievement, Card, Catalog, CatalogData, Character, Ending, ValidationError};
use tracing::{debug, info};

/// Pack schema understood by this loader.
pub const SCHEMA_VERSION: u32 = 1;

/// Metadata for a content pack.
#[derive(Debug, Clone, Deserialize)]
pub struct PackMeta {
    pub id: String,
    pub name: String,
    pub version: String,
    pub schema_version: u32,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("io error: {0}")]
    Io(String),
    #[error("missing pack file: {0}")]
    MissingFile(PathBuf),
    #[error("{file}: {message}")]
    Parse { file: String, message: String },
    #[error("pack schema {found} is not supported (expected {expected})")]
    SchemaMismatch { found: u32, expected: u32 },
    #[error("invalid content: {0}")]
    Invalid(#[from] ValidationError),
}

impl From<std::io::Error> for ContentError {
    fn from(e: std::io::Error) -> Self {
        ContentError::Io(e.to_string())
    }
}

/// Parsed but not yet validated pack.
#[derive(Debug, Clone)]
pub struct ContentPack {
    pub meta: PackMeta,
    pub dir: PathBuf,
    pub data: CatalogData,
}

impl ContentPack {
    /// Read and parse every file of the pack at `dir`.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ContentError> {
        let dir = dir.as_ref().to_path_buf();
        let meta: PackMeta = read_yaml(&dir.join("pack.yaml"))?;
        if meta.schema_version != SCHEMA_VERSION {
            return Err(ContentError::SchemaMismatch {
                found: meta.schema_version,
                expected: SCHEMA_VERSION,
            });
        }

        let characters: Vec<Character> = read_optional(&dir.join("characters.yaml"))?;
        let endings: Vec<Ending> = read_yaml(&dir.join("endings.yaml"))?;
        let achievements: Vec<Achievement> = read_optional(&dir.join("achievements.yaml"))?;

        let cards_dir = dir.join("cards");
        if !cards_dir.is_dir() {
            return Err(ContentError::MissingFile(cards_dir));
        }
        let mut files = Vec::new();
        for ent in fs::read_dir(&cards_dir)? {
            let path = ent?.path();
            if path.extension().is_some_and(|e| e == "yaml" || e == "yml") {
                files.push(path);
            }
        }
        files.sort();
        let mut cards = Vec::new();
        for f in &files {
            let mut batch: Vec<Card> = read_yaml(f)?;
            debug!(file = %f.display(), cards = batch.len(), "card file parsed");
            cards.append(&mut batch);
        }

        info!(
            pack = %meta.id,
            version = %meta.version,
            cards = cards.len(),
            characters = characters.len(),
            endings = endings.len(),
            achievements = achievements.len(),
            "content pack loaded"
        );
        Ok(Self {
            meta,
            dir,
            data: CatalogData {
                characters,
                cards,
                endings,
                achievements,
            },
        })
    }

    /// Validate and index the pack.
    pub fn into_catalog(self) -> Result<Catalog, ContentError> {
        Ok(Catalog::new(self.data)?)
    }
}

/// Load, parse and validate the pack at `dir`.
pub fn load_catalog<P: AsRef<Path>>(dir: P) -> Result<Catalog, ContentError> {
    ContentPack::load_dir(dir)?.into_catalog()
}

/// Parse a YAML list of cards, e.g. for tooling that builds packs in memory.
pub fn parse_cards(text: &str) -> Result<Vec<Card>, ContentError> {
    parse_yaml(text, "<inline>")
}

fn parse_yaml<T: DeserializeOwned>(text: &str, file: &str) -> Result<T, ContentError> {
    serde_yaml::from_str(text).map_err(|e| ContentError::Parse {
        file: file.to_string(),
        message: e.to_string(),
    })
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, ContentError> {
    if !path.exists() {
        return Err(ContentError::MissingFile(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    parse_yaml(&text, &path.display().to_string())
}

fn read_optional<T: DeserializeOwned + Default>(path: &Path) -> Result<T, ContentError> {
    if !path.exists() {
        return Ok(T::default());
    }
    read_yaml(path)
}

/// Directory of the demo pack shipped with the repository.
pub fn demo_pack_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/content")
}
