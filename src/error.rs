//! Error types.
//!
//! Two families, split by where they may surface:
//! - [`TagError`] lives *inside* a provider. It never crosses the
//!   `TagProvider` seam; providers fold it into `false` / empty data.
//! - [`WorkerError`] is transport-level. Any of these ends the worker.

use std::io;

use thiserror::Error;

/// Result type for provider internals.
pub type TagResult<T> = Result<T, TagError>;

/// Failures while reading or writing tags for a single file.
#[derive(Error, Debug)]
pub enum TagError {
    /// Opening / reading / stat-ing the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The `id3` crate rejected the tag (or could not write it).
    #[error("ID3 error: {0}")]
    Id3(#[from] id3::Error),

    /// Symphonia could not probe or parse the container.
    #[error("container probe failed: {0}")]
    Probe(#[from] symphonia::core::errors::Error),

    /// The operation is not available for this file type.
    #[error("unsupported for {path}: {reason}")]
    Unsupported {
        /// Display form of the file path.
        path: String,
        /// What was attempted.
        reason: &'static str,
    },

    /// The request did not carry the value this write needs.
    #[error("request has no {field}")]
    MissingField {
        /// Name of the absent `TrackMetadata` field.
        field: &'static str,
    },

    /// A chiptune header did not match its documented layout.
    #[error("malformed {format} header: {message}")]
    Malformed {
        /// Format family ("SPC", "VGM").
        format: &'static str,
        /// Human-readable description.
        message: String,
    },
}

impl TagError {
    pub fn unsupported(path: &std::path::Path, reason: &'static str) -> Self {
        Self::Unsupported {
            path: path.display().to_string(),
            reason,
        }
    }

    pub fn malformed(format: &'static str, message: impl Into<String>) -> Self {
        Self::Malformed {
            format,
            message: message.into(),
        }
    }
}

/// Result type for channel operations.
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Transport failures. Every variant is terminal for the worker.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Failed to read from the channel.
    #[error("failed to read from channel: {0}")]
    ReadFailed(#[source] io::Error),

    /// Failed to write to the channel.
    #[error("failed to write to channel: {0}")]
    WriteFailed(#[source] io::Error),

    /// Failed to serialize a reply.
    #[error("failed to serialize reply: {0}")]
    EncodeFailed(#[source] serde_json::Error),

    /// Could not connect to the host's socket.
    #[error("failed to connect to {path}: {source}")]
    ConnectFailed {
        path: String,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn unsupported_mentions_path_and_reason() {
        let e = TagError::unsupported(Path::new("/music/a.flac"), "ID3 write");
        let msg = e.to_string();
        assert!(msg.contains("/music/a.flac"));
        assert!(msg.contains("ID3 write"));
    }

    #[test]
    fn io_errors_convert() {
        let e: TagError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(e, TagError::Io(_)));
    }
}
