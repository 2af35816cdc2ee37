use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::StoreError;

const LOG_SUFFIX: &str = ".log";
const ARCHIVE_SUFFIX: &str = ".gz.b64";

/// Append-only per-check log files with compress-and-truncate rotation.
///
/// Active logs live at `<name>.log` as plain JSON lines; rotated
/// archives at `<archive>.gz.b64` hold the gzipped log base64-encoded
/// so the whole logs directory stays text-safe.
pub struct LogStore {
    base_dir: PathBuf,
}

impl LogStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    fn log_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{name}{LOG_SUFFIX}"))
    }

    fn archive_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(format!("{name}{ARCHIVE_SUFFIX}"))
    }

    /// Append one line to the named log, creating it if absent.
    ///
    /// Appends to distinct names are fully independent; appends to the
    /// same name rely on the O_APPEND contract, so lines never
    /// interleave partially.
    pub async fn append(&self, name: &str, line: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_dir).await?;

        let mut file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(self.log_path(name))
            .await?;
        file.write_all(format!("{line}\n").as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// List log names, optionally including rotated archives. Names
    /// come back with their suffixes stripped.
    pub async fn list(&self, include_compressed: bool) -> Result<Vec<String>, StoreError> {
        let mut entries = match fs::read_dir(&self.base_dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else { continue };

            if let Some(name) = file_name.strip_suffix(LOG_SUFFIX) {
                names.push(name.to_string());
            } else if include_compressed {
                if let Some(name) = file_name.strip_suffix(ARCHIVE_SUFFIX) {
                    names.push(name.to_string());
                }
            }
        }

        Ok(names)
    }

    /// Compress the named log into `<archive>.gz.b64`, leaving the
    /// original untouched. The archive is created exclusively so a
    /// rotation can never clobber an earlier one.
    pub async fn compress(&self, name: &str, archive: &str) -> Result<(), StoreError> {
        let input = match fs::read(self.log_path(name)).await {
            Ok(input) => input,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(err) => return Err(err.into()),
        };

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&input)?;
        let compressed = encoder.finish()?;
        let encoded = BASE64.encode(compressed);

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.archive_path(archive))
            .await
        {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists);
            }
            Err(err) => return Err(err.into()),
        };
        file.write_all(encoded.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Recover the original text of a rotated archive.
    pub async fn decompress(&self, archive: &str) -> Result<String, StoreError> {
        let encoded = match fs::read_to_string(self.archive_path(archive)).await {
            Ok(encoded) => encoded,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(err) => return Err(err.into()),
        };

        let compressed = BASE64.decode(encoded.trim_end())?;
        let mut output = String::new();
        GzDecoder::new(compressed.as_slice()).read_to_string(&mut output)?;
        Ok(output)
    }

    /// Zero the named log in place, keeping the file itself.
    pub async fn truncate(&self, name: &str) -> Result<(), StoreError> {
        let file = match fs::OpenOptions::new().write(true).open(self.log_path(name)).await {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(err) => return Err(err.into()),
        };
        file.set_len(0).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_store() -> (tempfile::TempDir, LogStore) {
        let dir = tempdir().unwrap();
        let store = LogStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn append_accumulates_lines() {
        let (dir, store) = test_store();
        store.append("abc", r#"{"n":1}"#).await.unwrap();
        store.append("abc", r#"{"n":2}"#).await.unwrap();

        let content = std::fs::read_to_string(dir.path().join("abc.log")).unwrap();
        assert_eq!(content, "{\"n\":1}\n{\"n\":2}\n");
    }

    #[tokio::test]
    async fn list_separates_active_from_compressed() {
        let (_dir, store) = test_store();
        store.append("active", "x").await.unwrap();
        store.compress("active", "active-123").await.unwrap();

        let mut without = store.list(false).await.unwrap();
        without.sort();
        assert_eq!(without, vec!["active"]);

        let mut with = store.list(true).await.unwrap();
        with.sort();
        assert_eq!(with, vec!["active", "active-123"]);
    }

    #[tokio::test]
    async fn list_empty_directory_returns_empty_sequence() {
        let (_dir, store) = test_store();
        assert!(store.list(true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rotation_preserves_content_and_empties_live_log() {
        let (dir, store) = test_store();
        store.append("check1", r#"{"state":"up"}"#).await.unwrap();
        store.append("check1", r#"{"state":"down"}"#).await.unwrap();

        store.compress("check1", "check1-1700000000000").await.unwrap();
        store.truncate("check1").await.unwrap();

        let recovered = store.decompress("check1-1700000000000").await.unwrap();
        assert_eq!(recovered, "{\"state\":\"up\"}\n{\"state\":\"down\"}\n");

        let live = std::fs::metadata(dir.path().join("check1.log")).unwrap();
        assert_eq!(live.len(), 0);
    }

    #[tokio::test]
    async fn compress_missing_log_fails_with_not_found() {
        let (_dir, store) = test_store();
        let result = store.compress("ghost", "ghost-1").await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn compress_refuses_to_overwrite_archive() {
        let (_dir, store) = test_store();
        store.append("a", "line").await.unwrap();
        store.compress("a", "a-1").await.unwrap();

        let result = store.compress("a", "a-1").await;
        assert!(matches!(result, Err(StoreError::AlreadyExists)));
    }
}
