//! FTP transport. Each call opens one session, does its work and quits.
//!
//! The client is blocking, so the work runs on tokio's blocking pool.

use std::fmt;
use std::io::Cursor;

use anyhow::{Context, Result, anyhow};
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpResult, FtpStream, Status};
use tracing::{debug, info};

use crate::constants::DEFAULT_FTP_PORT;

/// Connection details for the remote host. Credentials are passed through as-is.
#[derive(Clone)]
pub struct FtpSettings {
    /// `host` or `host:port`.
    pub host: String,
    /// Login name.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Directory every remote path is relative to; empty means the login directory.
    pub base_path: String,
}

impl fmt::Debug for FtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpSettings")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("base_path", &self.base_path)
            .finish()
    }
}

impl FtpSettings {
    /// Socket address, adding the default port when none is given.
    pub fn address(&self) -> String {
        if self.host.contains(':') {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, DEFAULT_FTP_PORT)
        }
    }

    /// Joins `relative` onto the base path.
    pub fn remote_path(&self, relative: &str) -> String {
        let relative = relative.trim_matches('/');
        let base = self.base_path.trim_end_matches('/');
        if base.is_empty() && !self.base_path.starts_with('/') {
            relative.to_string()
        } else {
            format!("{base}/{relative}")
        }
    }
}

fn connect(settings: &FtpSettings) -> Result<FtpStream> {
    let address = settings.address();
    debug!("Connecting to {address}");
    let mut stream =
        FtpStream::connect(&address).with_context(|| format!("Failed to connect to {address}"))?;
    stream
        .login(settings.user.as_str(), settings.password.as_str())
        .with_context(|| format!("Login to {address} rejected"))?;
    stream
        .transfer_type(FileType::Binary)
        .context("Failed to switch to binary mode")?;
    Ok(stream)
}

/// Creates each directory leading up to `path`, ignoring ones that already exist.
fn ensure_parent_dirs(stream: &mut FtpStream, path: &str) {
    let Some((parent, _)) = path.rsplit_once('/') else {
        return;
    };
    let mut current = String::new();
    for part in parent.split('/') {
        if part.is_empty() {
            if current.is_empty() {
                current.push('/');
            }
            continue;
        }
        if !current.is_empty() && !current.ends_with('/') {
            current.push('/');
        }
        current.push_str(part);
        if let Err(err) = stream.mkdir(&current) {
            debug!("mkdir {current}: {err}");
        }
    }
}

async fn with_session<T, F>(settings: &FtpSettings, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut FtpStream) -> Result<T> + Send + 'static,
{
    let settings = settings.clone();
    tokio::task::spawn_blocking(move || {
        let mut stream = connect(&settings)?;
        let result = work(&mut stream);
        if let Err(err) = stream.quit() {
            debug!("FTP quit failed: {err}");
        }
        result
    })
    .await
    .map_err(|err| anyhow!("FTP task failed: {err}"))?
}

/// Uploads each `(relative path, bytes)` pair in one session, replacing existing files.
pub async fn upload(settings: &FtpSettings, files: Vec<(String, Vec<u8>)>) -> Result<()> {
    let targets: Vec<(String, Vec<u8>)> = files
        .into_iter()
        .map(|(relative, bytes)| (settings.remote_path(&relative), bytes))
        .collect();
    with_session(settings, move |stream| {
        for (path, bytes) in targets {
            ensure_parent_dirs(stream, &path);
            let written = stream
                .put_file(&path, &mut Cursor::new(bytes))
                .with_context(|| format!("Failed to upload {path}"))?;
            info!("Uploaded {path} ({written} bytes)");
        }
        Ok(())
    })
    .await
}

/// Downloads one file, relative to the base path.
pub async fn download(settings: &FtpSettings, relative: &str) -> Result<Vec<u8>> {
    let path = settings.remote_path(relative);
    with_session(settings, move |stream| {
        let buffer = stream
            .retr_as_buffer(&path)
            .with_context(|| format!("Failed to download {path}"))?;
        Ok(buffer.into_inner())
    })
    .await
}

/// Plain files in one directory, relative to the base path, reduced to bare
/// names. Entries failing `keep` are dropped before any further round trips;
/// the rest are checked with SIZE, which servers refuse for directories.
/// A directory the server reports as unavailable (550) lists as empty.
pub async fn list_files(
    settings: &FtpSettings,
    relative_dir: &str,
    keep: fn(&str) -> bool,
) -> Result<Vec<String>> {
    let path = settings.remote_path(relative_dir);
    with_session(settings, move |stream| {
        let entries = missing_as_empty(stream.nlst(Some(path.as_str())))
            .with_context(|| format!("Failed to list {path}"))?;
        let mut files = Vec::new();
        for name in entries.iter().map(|entry| remote_file_name(entry)) {
            if name.is_empty() || !keep(name) {
                continue;
            }
            let full = entry_path(&path, name);
            match stream.size(&full) {
                Ok(_) => files.push(name.to_string()),
                Err(err) => debug!("skipping {full}, not a plain file: {err}"),
            }
        }
        Ok(files)
    })
    .await
}

fn missing_as_empty(result: FtpResult<Vec<String>>) -> FtpResult<Vec<String>> {
    match result {
        Err(err) if is_unavailable(&err) => Ok(Vec::new()),
        other => other,
    }
}

fn is_unavailable(err: &FtpError) -> bool {
    matches!(err, FtpError::UnexpectedResponse(response) if response.status == Status::FileUnavailable)
}

fn entry_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{name}", dir.trim_end_matches('/'))
    }
}

/// Some servers answer NLST with full paths.
fn remote_file_name(entry: &str) -> &str {
    entry.trim_end_matches('/').rsplit('/').next().unwrap_or(entry)
}
