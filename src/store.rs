//! JSON persistence for asset descriptions
//!
//! One file per submission in the output directory, named
//! `<title>_<YYYYmmdd_HHMMSS>.json`.

use chrono::{Local, NaiveDateTime};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::asset::AssetDescription;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot create output directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("cannot write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid file name '{0}'")]
    InvalidName(String),
}

/// Result of a successful save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAsset {
    pub filename: String,
    pub path: PathBuf,
    /// Exact file contents
    pub json: String,
}

/// Writes asset descriptions under one output directory
#[derive(Debug, Clone)]
pub struct AssetStore {
    output_dir: PathBuf,
}

impl AssetStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }

    /// Save with the current local time in the file name
    pub fn save(&self, asset: &AssetDescription) -> Result<SavedAsset, StoreError> {
        self.save_at(asset, Local::now().naive_local())
    }

    pub fn save_at(&self, asset: &AssetDescription, timestamp: NaiveDateTime) -> Result<SavedAsset, StoreError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| StoreError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let filename = file_name(&asset.dcat.title, timestamp);
        let path = self.output_dir.join(&filename);
        let json = asset.to_json_pretty()?;

        fs::write(&path, &json).map_err(|source| StoreError::Write { path: path.clone(), source })?;
        tracing::info!("Saved asset description to {}", path.display());

        Ok(SavedAsset { filename, path, json })
    }

    /// Read back a previously saved file by name
    ///
    /// Only plain `.json` file names inside the output directory are served.
    pub fn read(&self, filename: &str) -> Result<String, StoreError> {
        let valid = filename.ends_with(".json")
            && !filename.starts_with('.')
            && !filename.contains(['/', '\\'])
            && Path::new(filename).file_name().is_some_and(|f| f == filename);
        if !valid {
            return Err(StoreError::InvalidName(filename.to_string()));
        }

        let path = self.output_dir.join(filename);
        fs::read_to_string(&path).map_err(|source| StoreError::Read { path, source })
    }
}

/// `<title>_<YYYYmmdd_HHMMSS>.json`
///
/// Spaces become underscores; so does anything that is not safe in a file
/// name on common filesystems.
pub fn file_name(title: &str, timestamp: NaiveDateTime) -> String {
    let stem: String = title
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = stem.trim_start_matches('.');

    format!("{}_{}.json", stem, timestamp.format("%Y%m%d_%H%M%S"))
}
