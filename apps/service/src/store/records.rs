use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::StoreError;

/// Durable create/read/update/delete/list over named collections.
///
/// Each collection is a directory under `base_dir`; each record is one
/// JSON document at `<collection>/<id>.json`. The deployment model is
/// single-process, so no cross-process locking is attempted; individual
/// file operations are serialized by the OS.
pub struct RecordStore {
    base_dir: PathBuf,
}

impl RecordStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    fn record_path(&self, collection: &str, id: &str) -> PathBuf {
        self.base_dir.join(collection).join(format!("{id}.json"))
    }

    /// Create a new record. Fails with `AlreadyExists` if the key is
    /// taken; the existing document is left untouched.
    pub async fn create<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        document: &T,
    ) -> Result<(), StoreError> {
        let path = self.record_path(collection, id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // create_new gives the exclusive-create semantics: never
        // silently overwrite a record that is already present.
        let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists);
            }
            Err(err) => return Err(err.into()),
        };

        let data = serde_json::to_vec(document)?;
        file.write_all(&data).await?;
        file.flush().await?;
        Ok(())
    }

    /// Read and deserialize the record at `(collection, id)`.
    pub async fn read<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<T, StoreError> {
        let path = self.record_path(collection, id);
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(err) => return Err(err.into()),
        };

        Ok(serde_json::from_slice(&data)?)
    }

    /// Overwrite an existing record with a full new document.
    ///
    /// The document is written to a temp file and renamed into place,
    /// so a concurrent reader sees either the old or the new document,
    /// never a truncated one. Each update gets its own temp file, so
    /// two writers racing on the same record each install a whole
    /// document and the later rename wins.
    pub async fn update<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        document: &T,
    ) -> Result<(), StoreError> {
        let path = self.record_path(collection, id);
        if !fs::try_exists(&path).await? {
            return Err(StoreError::NotFound);
        }

        let data = serde_json::to_vec(document)?;
        // The `.tmp` suffix keeps half-written files out of `list`.
        let tmp_path = self
            .base_dir
            .join(collection)
            .join(format!("{id}.{}.tmp", crate::helpers::random_string(8)));

        let mut tmp = fs::File::create(&tmp_path).await?;
        tmp.write_all(&data).await?;
        tmp.flush().await?;
        drop(tmp);

        // The rename still lands if the record was deleted between the
        // existence check and here, briefly resurrecting it. Narrow in
        // the single-process deployment, and resolved the same way as
        // overlapping probe passes: last writer wins.
        fs::rename(&tmp_path, &path).await?;
        Ok(())
    }

    /// Delete the record at `(collection, id)`.
    ///
    /// Callers own any referential cleanup (e.g. removing a deleted
    /// check from its owner's record); the store leaves no trace but
    /// does not chase references.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let path = self.record_path(collection, id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(StoreError::NotFound),
            Err(err) => Err(err.into()),
        }
    }

    /// List all record IDs in a collection, order unspecified.
    ///
    /// A collection that was never written to is an empty sequence,
    /// not an error.
    pub async fn list(&self, collection: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.base_dir.join(collection);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(id) = name.strip_suffix(".json") {
                ids.push(id.to_string());
            }
        }

        Ok(ids)
    }
}
