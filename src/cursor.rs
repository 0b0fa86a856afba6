//! Cursor persistence: which images this cycle has already used.

use std::path::{Path, PathBuf};

use anyhow::Result;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::pool::ImageId;
use crate::record::HaikuRecord;
use crate::storage::{read_json_lenient, write_json_atomic};

/// Images used so far in the current cycle, oldest first.
///
/// Stored as a plain JSON array of file names. Names that have since left the
/// pool stay in the list; they just never match anything.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsedImages(Vec<String>);

impl UsedImages {
    /// True when `image` was already used this cycle.
    pub fn contains(&self, image: &ImageId) -> bool {
        self.0.iter().any(|used| used == image.name())
    }

    /// Records `image` as used.
    pub fn push(&mut self, image: &ImageId) {
        self.0.push(image.name().to_string());
    }

    /// Used names, oldest first.
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing has been used.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for UsedImages {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// The used-image history file (`haikus/used_images.json` by default).
#[derive(Clone, Debug)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    /// History kept at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Where the history lives.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the history. A missing, unreadable or malformed file is an empty history.
    pub fn load(&self) -> UsedImages {
        let used: UsedImages = read_json_lenient(&self.path).unwrap_or_default();
        debug!(path = %self.path.display(), entries = used.len(), "cursor loaded");
        used
    }

    /// Replaces the history on disk (temp file + rename).
    pub fn save(&self, used: &UsedImages) -> Result<()> {
        debug!(path = %self.path.display(), entries = used.len(), "writing cursor");
        write_json_atomic(&self.path, used)
    }
}

/// The image a published record points at, taken from the last path segment
/// of its `image` field. Absolute URLs are percent-decoded; query strings and
/// fragments are ignored.
pub fn last_image_from_record(record: &HaikuRecord) -> Option<ImageId> {
    let reference = record.image.trim();
    if let Ok(url) = Url::parse(reference) {
        let segment = url
            .path_segments()?
            .rev()
            .find(|segment| !segment.is_empty())?;
        let name = percent_decode_str(segment).decode_utf8().ok()?;
        return ImageId::from_file_name(&name);
    }

    let reference = reference
        .split(['?', '#'])
        .next()
        .unwrap_or(reference)
        .trim_end_matches('/');
    let name = reference.rsplit('/').next()?;
    ImageId::from_file_name(name)
}
