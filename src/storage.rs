//! Small JSON file helpers shared by the cursor and record stores.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Reads `path` as JSON. Missing files come back as `None`; unreadable or
/// malformed ones are logged and also come back as `None`.
pub(crate) fn read_json_lenient<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "no file yet");
            return None;
        }
        Err(err) => {
            warn!(path = %path.display(), "Failed to read, ignoring: {err}");
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(path = %path.display(), "Malformed JSON, ignoring: {err}");
            None
        }
    }
}

/// Pretty-printed JSON with a trailing newline.
pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buf = serde_json::to_string_pretty(value)?;
    buf.push('\n');
    Ok(buf)
}

/// Atomically write JSON to disk (temp file + rename).
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let buf = to_pretty_json(value)?;
    write_atomic(path, buf.as_bytes())
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, contents).with_context(|| format!("write temp {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

/// Sibling temp path, unique per process and per write so overlapping runs
/// never share one.
fn temp_path_for(path: &Path) -> PathBuf {
    static TEMP_SEQ: AtomicUsize = AtomicUsize::new(0);
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(format!(".{}.{seq}.tmp", std::process::id()));
    path.with_file_name(tmp_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_and_malformed_files_read_as_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("state.json");
        assert_eq!(read_json_lenient::<Vec<String>>(&path), None);

        fs::write(&path, "{not json").expect("write");
        assert_eq!(read_json_lenient::<Vec<String>>(&path), None);

        fs::write(&path, "{\"wrong\": \"shape\"}").expect("write");
        assert_eq!(read_json_lenient::<Vec<String>>(&path), None);
    }

    #[test]
    fn atomic_write_creates_parents_and_leaves_no_temp_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested/dir/state.json");

        write_json_atomic(&path, &vec!["a.jpg"]).expect("write");
        let contents = fs::read_to_string(&path).expect("read");
        assert_eq!(contents, "[\n  \"a.jpg\"\n]\n");
        let leftovers: Vec<_> = fs::read_dir(path.parent().expect("parent"))
            .expect("read dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name())
            .filter(|name| name != "state.json")
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");

        write_json_atomic(&path, &vec!["a.jpg", "b.png"]).expect("overwrite");
        assert_eq!(
            read_json_lenient::<Vec<String>>(&path),
            Some(vec!["a.jpg".to_string(), "b.png".to_string()])
        );
    }

    #[test]
    fn temp_paths_are_unique_per_write() {
        let path = Path::new("haikus/used_images.json");
        let first = temp_path_for(path);
        let second = temp_path_for(path);
        assert_ne!(first, second);
        assert_eq!(first.parent(), path.parent());
        let name = first.file_name().and_then(|name| name.to_str()).expect("name");
        assert!(name.starts_with("used_images.json."));
        assert!(name.contains(&std::process::id().to_string()));
        assert!(name.ends_with(".tmp"));
    }
}
