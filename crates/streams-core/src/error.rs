use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while loading, aggregating and exporting streams.
#[derive(Error, Debug)]
pub enum StreamsError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The export archive is missing, truncated or not a zip file.
    #[error("Failed to read archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// An archive member matched the event-log filter but is not UTF-8 text.
    #[error("Archive member {member} is not valid UTF-8: {source}")]
    MemberEncoding {
        member: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A record inside an event-log member does not have the expected shape.
    #[error("Invalid record {index} in {member}: {reason}")]
    InvalidRecord {
        member: String,
        index: usize,
        reason: String,
    },

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A song identity was requested that no stream carries.
    #[error("Song not found in streams: {0}")]
    SongNotFound(String),

    /// The binary snapshot could not be written.
    #[error("Failed to encode snapshot: {0}")]
    SnapshotEncode(#[from] rmp_serde::encode::Error),

    /// The binary snapshot could not be read back.
    #[error("Failed to decode snapshot: {0}")]
    SnapshotDecode(#[from] rmp_serde::decode::Error),

    /// The spreadsheet writer rejected a value or failed to save.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the streams crates.
pub type Result<T> = std::result::Result<T, StreamsError>;
