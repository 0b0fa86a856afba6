//! Writing the record locally and pushing it, with its image, to the FTP host.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::constants::{REMOTE_IMAGE_DIR, REMOTE_RECORD_PATH};
use crate::ftp::{self, FtpSettings};
use crate::pool::ImageId;
use crate::record::HaikuRecord;

/// Where records go, and where the last one can be read back from.
#[allow(async_fn_in_trait)]
pub trait Publisher {
    /// Replaces the current record and ships the image alongside it.
    async fn publish(&self, record: &HaikuRecord, image: &ImageId, bytes: &[u8]) -> Result<()>;

    /// The most recently published record, if one can be read.
    async fn last_record(&self) -> Option<HaikuRecord>;
}

/// Writes the record to a local file only.
#[derive(Clone, Debug)]
pub struct LocalPublisher {
    output_file: PathBuf,
}

impl LocalPublisher {
    /// Record kept at `output_file`.
    pub fn new(output_file: impl Into<PathBuf>) -> Self {
        Self {
            output_file: output_file.into(),
        }
    }
}

impl Publisher for LocalPublisher {
    async fn publish(&self, record: &HaikuRecord, _image: &ImageId, _bytes: &[u8]) -> Result<()> {
        record.save(&self.output_file)?;
        info!("Saved haiku to {}", self.output_file.display());
        Ok(())
    }

    async fn last_record(&self) -> Option<HaikuRecord> {
        HaikuRecord::load(&self.output_file)
    }
}

/// Writes the record locally, then uploads record and image to the FTP host.
#[derive(Clone, Debug)]
pub struct FtpPublisher {
    local: LocalPublisher,
    settings: FtpSettings,
}

impl FtpPublisher {
    /// Publishes to `settings`, keeping a local copy at `output_file`.
    pub fn new(output_file: impl Into<PathBuf>, settings: FtpSettings) -> Self {
        Self {
            local: LocalPublisher::new(output_file),
            settings,
        }
    }
}

impl Publisher for FtpPublisher {
    async fn publish(&self, record: &HaikuRecord, image: &ImageId, bytes: &[u8]) -> Result<()> {
        let json = record.to_json()?;
        let image_path = format!("{}/{}", REMOTE_IMAGE_DIR, image.name());
        debug!("Uploading {image_path} and {REMOTE_RECORD_PATH}");
        // image first, so the record never points at a file that isn't there yet
        ftp::upload(
            &self.settings,
            vec![
                (image_path, bytes.to_vec()),
                (REMOTE_RECORD_PATH.to_string(), json.into_bytes()),
            ],
        )
        .await
        .with_context(|| format!("Failed to publish to {}", self.settings.host))?;

        self.local.publish(record, image, bytes).await
    }

    async fn last_record(&self) -> Option<HaikuRecord> {
        let bytes = match ftp::download(&self.settings, REMOTE_RECORD_PATH).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Couldn't fetch the published record: {err:#}");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("Published record is malformed, ignoring: {err}");
                None
            }
        }
    }
}

/// The publisher picked at startup.
#[derive(Clone, Debug)]
pub enum AnyPublisher {
    /// Local file only.
    Local(LocalPublisher),
    /// Local file plus FTP upload.
    Ftp(FtpPublisher),
}

impl Publisher for AnyPublisher {
    async fn publish(&self, record: &HaikuRecord, image: &ImageId, bytes: &[u8]) -> Result<()> {
        match self {
            Self::Local(publisher) => publisher.publish(record, image, bytes).await,
            Self::Ftp(publisher) => publisher.publish(record, image, bytes).await,
        }
    }

    async fn last_record(&self) -> Option<HaikuRecord> {
        match self {
            Self::Local(publisher) => publisher.last_record().await,
            Self::Ftp(publisher) => publisher.last_record().await,
        }
    }
}
