//! Image pool listing, from a local directory or the FTP host.

use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::IMAGE_EXTENSIONS;
use crate::ftp::{self, FtpSettings};

/// One image in the pool, named by its file name.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    /// Accepts a bare file name with a jpg, jpeg or png extension (any case).
    pub fn from_file_name(name: &str) -> Option<Self> {
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return None;
        }
        let (_, ext) = name.rsplit_once('.')?;
        IMAGE_EXTENSIONS
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed))
            .then(|| Self(name.to_string()))
    }

    /// The file name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Lower-cased extension.
    pub fn extension(&self) -> String {
        self.0
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// MIME type implied by the extension.
    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_str() {
            "png" => "image/png",
            _ => "image/jpeg",
        }
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Filters raw directory entries down to pool members, sorted ascending.
pub fn build_pool<I, S>(names: I) -> Vec<ImageId>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut pool: Vec<ImageId> = names
        .into_iter()
        .filter_map(|name| ImageId::from_file_name(name.as_ref()))
        .collect();
    pool.sort();
    pool.dedup();
    pool
}

/// Somewhere images can be listed and read from.
#[allow(async_fn_in_trait)]
pub trait ImageSource {
    /// Current pool, filtered and sorted.
    async fn list(&self) -> Result<Vec<ImageId>>;

    /// Raw bytes of one pool member.
    async fn fetch(&self, image: &ImageId) -> Result<Vec<u8>>;
}

/// Pool backed by a local directory.
#[derive(Clone, Debug)]
pub struct LocalDirSource {
    dir: PathBuf,
}

impl LocalDirSource {
    /// Lists images in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ImageSource for LocalDirSource {
    async fn list(&self) -> Result<Vec<ImageId>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(dir = %self.dir.display(), "image directory missing, pool is empty");
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(anyhow!("Failed to read {}: {}", self.dir.display(), err));
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(build_pool(names))
    }

    async fn fetch(&self, image: &ImageId) -> Result<Vec<u8>> {
        let path = self.dir.join(image.name());
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}

/// Pool backed by a directory on the FTP host.
#[derive(Clone, Debug)]
pub struct RemoteDirSource {
    settings: FtpSettings,
    dir: String,
}

impl RemoteDirSource {
    /// Lists images in `dir`, relative to the FTP base path.
    pub fn new(settings: FtpSettings, dir: &str) -> Self {
        Self {
            settings,
            dir: dir.to_string(),
        }
    }
}

impl ImageSource for RemoteDirSource {
    async fn list(&self) -> Result<Vec<ImageId>> {
        let names = ftp::list_files(&self.settings, &self.dir, |name| {
            ImageId::from_file_name(name).is_some()
        })
        .await?;
        Ok(build_pool(names))
    }

    async fn fetch(&self, image: &ImageId) -> Result<Vec<u8>> {
        ftp::download(&self.settings, &format!("{}/{}", self.dir, image.name())).await
    }
}

/// The pool source picked at startup.
#[derive(Clone, Debug)]
pub enum PoolSource {
    /// Local directory.
    Local(LocalDirSource),
    /// FTP directory.
    Remote(RemoteDirSource),
}

impl ImageSource for PoolSource {
    async fn list(&self) -> Result<Vec<ImageId>> {
        match self {
            Self::Local(source) => source.list().await,
            Self::Remote(source) => source.list().await,
        }
    }

    async fn fetch(&self, image: &ImageId) -> Result<Vec<u8>> {
        match self {
            Self::Local(source) => source.fetch(image).await,
            Self::Remote(source) => source.fetch(image).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<ImageId> {
        names
            .iter()
            .map(|name| ImageId::from_file_name(name).expect("valid image name"))
            .collect()
    }

    #[test]
    fn only_allowed_extensions_are_images() {
        assert!(ImageId::from_file_name("a.jpg").is_some());
        assert!(ImageId::from_file_name("b.JPEG").is_some());
        assert!(ImageId::from_file_name("c.Png").is_some());
        assert!(ImageId::from_file_name("d.gif").is_none());
        assert!(ImageId::from_file_name("jpg").is_none());
        assert!(ImageId::from_file_name("notes.txt").is_none());
        assert!(ImageId::from_file_name("dir/a.jpg").is_none());
        assert!(ImageId::from_file_name("").is_none());
    }

    #[test]
    fn extension_and_mime_follow_the_name() {
        let png = ImageId::from_file_name("Sunset.PNG").expect("png");
        assert_eq!(png.extension(), "png");
        assert_eq!(png.mime_type(), "image/png");
        let jpeg = ImageId::from_file_name("river.jpeg").expect("jpeg");
        assert_eq!(jpeg.mime_type(), "image/jpeg");
    }

    #[test]
    fn pool_is_filtered_sorted_and_deduplicated() {
        let pool = build_pool(["c.jpeg", "readme.md", "a.jpg", "b.png", "a.jpg"]);
        assert_eq!(pool, ids(&["a.jpg", "b.png", "c.jpeg"]));
    }

    #[tokio::test]
    async fn local_source_lists_and_reads_images() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("b.png"), b"png bytes").expect("write");
        std::fs::write(temp.path().join("a.JPG"), b"jpg bytes").expect("write");
        std::fs::write(temp.path().join("notes.txt"), b"ignored").expect("write");
        std::fs::create_dir(temp.path().join("c.jpg")).expect("mkdir");

        let source = LocalDirSource::new(temp.path());
        let pool = source.list().await.expect("list");
        assert_eq!(pool, ids(&["a.JPG", "b.png"]));

        let bytes = source.fetch(&pool[1]).await.expect("fetch");
        assert_eq!(bytes, b"png bytes");
    }

    #[tokio::test]
    async fn missing_local_directory_is_an_empty_pool() {
        let temp = tempfile::tempdir().expect("tempdir");
        let source = LocalDirSource::new(temp.path().join("nope"));
        assert!(source.list().await.expect("list").is_empty());
    }
}
