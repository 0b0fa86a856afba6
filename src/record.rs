//! The published haiku record.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::RECORD_IMAGE_PREFIX;
use crate::pool::ImageId;
use crate::storage::{read_json_lenient, to_pretty_json, write_json_atomic};

/// One day's haiku. Each run replaces the previous record.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct HaikuRecord {
    /// UTC calendar day the record was made, `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Relative path or absolute URL of the image.
    pub image: String,
    /// Model output, trimmed.
    pub haiku: String,
}

impl HaikuRecord {
    /// Record dated today (UTC).
    pub fn today(image: String, haiku: &str) -> Self {
        Self {
            date: Utc::now().date_naive(),
            image,
            haiku: haiku.trim().to_string(),
        }
    }

    /// Serialized form, as written locally and uploaded.
    pub fn to_json(&self) -> Result<String> {
        to_pretty_json(self)
    }

    /// Reads a record, or `None` if it's missing or malformed.
    pub fn load(path: &Path) -> Option<Self> {
        read_json_lenient(path)
    }

    /// Replaces the record at `path` (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, self)
            .with_context(|| format!("Failed to save record to {}", path.display()))
    }
}

/// What goes in a record's `image` field: `images/<name>`, or an absolute URL
/// under `public_base` when one is configured.
pub fn image_reference(public_base: Option<&Url>, image: &ImageId) -> Result<String> {
    let relative = format!("{}/{}", RECORD_IMAGE_PREFIX, image.name());
    let Some(base) = public_base else {
        return Ok(relative);
    };
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let url = base
        .join(&relative)
        .with_context(|| format!("Failed to build image URL from {base}"))?;
    Ok(url.to_string())
}
