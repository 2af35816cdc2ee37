/// Flat-file persistence layer
///
/// Two stores share this module:
/// - `records`: one JSON document per (collection, id) pair, used for
///   checks, users and tokens
/// - `logs`: append-only JSON-lines files per check, with gzip+base64
///   rotation archives
pub mod logs;
pub mod records;

pub use logs::LogStore;
pub use records::RecordStore;

use thiserror::Error;

/// Error taxonomy shared by the record and log stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists")]
    AlreadyExists,
    #[error("record not found")]
    NotFound,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("archive is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
}
