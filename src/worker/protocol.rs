//! Wire protocol: one JSON object per line.
//!
//! Request:  `{"id": 7, "request": {"type": "probe_file", "path": "/a.mp3"}}`
//! Response: `{"id": 7, "response": {"type": "probe_file", "success": true}}`
//!
//! The reply always echoes the request id so the host can correlate.
//! Byte blobs travel as base64 strings.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::types::TrackMetadata;
use crate::error::{WorkerError, WorkerResult};

// ============================================================================
// Envelopes
// ============================================================================

/// One decoded message from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Correlation id, echoed in the reply.
    #[serde(default)]
    pub id: u64,
    /// `None` for an empty request.
    #[serde(default)]
    pub request: Option<Request>,
}

/// One reply to the host. Exactly one per [`RequestEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub id: u64,
    pub response: Response,
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    ProbeFile {
        path: PathBuf,
    },
    ReadMetadata {
        path: PathBuf,
    },
    WriteMetadata {
        path: PathBuf,
        #[serde(default)]
        metadata: TrackMetadata,
    },
    ReadEmbeddedArt {
        path: PathBuf,
    },
    WriteEmbeddedArt {
        path: PathBuf,
        /// Empty removes the art.
        #[serde(with = "base64_bytes", default)]
        data: Vec<u8>,
    },
    WritePlaycount {
        path: PathBuf,
        #[serde(default)]
        metadata: TrackMetadata,
    },
    WriteRating {
        path: PathBuf,
        #[serde(default)]
        metadata: TrackMetadata,
    },
    /// Any `type` this worker does not know.
    #[serde(other)]
    Unknown,
}

/// Request variant without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    ProbeFile,
    ReadMetadata,
    WriteMetadata,
    ReadEmbeddedArt,
    WriteEmbeddedArt,
    WritePlaycount,
    WriteRating,
}

impl Request {
    /// `None` for [`Request::Unknown`].
    pub fn kind(&self) -> Option<RequestKind> {
        match self {
            Request::ProbeFile { .. } => Some(RequestKind::ProbeFile),
            Request::ReadMetadata { .. } => Some(RequestKind::ReadMetadata),
            Request::WriteMetadata { .. } => Some(RequestKind::WriteMetadata),
            Request::ReadEmbeddedArt { .. } => Some(RequestKind::ReadEmbeddedArt),
            Request::WriteEmbeddedArt { .. } => Some(RequestKind::WriteEmbeddedArt),
            Request::WritePlaycount { .. } => Some(RequestKind::WritePlaycount),
            Request::WriteRating { .. } => Some(RequestKind::WriteRating),
            Request::Unknown => None,
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestKind::ProbeFile => "probe_file",
            RequestKind::ReadMetadata => "read_metadata",
            RequestKind::WriteMetadata => "write_metadata",
            RequestKind::ReadEmbeddedArt => "read_embedded_art",
            RequestKind::WriteEmbeddedArt => "write_embedded_art",
            RequestKind::WritePlaycount => "write_playcount",
            RequestKind::WriteRating => "write_rating",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Reply to an empty or unrecognized request.
    #[default]
    Empty,
    ProbeFile {
        success: bool,
    },
    ReadMetadata {
        metadata: TrackMetadata,
    },
    WriteMetadata {
        success: bool,
    },
    ReadEmbeddedArt {
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
    },
    WriteEmbeddedArt {
        success: bool,
    },
    WritePlaycount {
        success: bool,
    },
    WriteRating {
        success: bool,
    },
}

impl Response {
    /// The not-yet-populated reply for a request variant.
    pub fn empty_for(kind: RequestKind) -> Self {
        match kind {
            RequestKind::ProbeFile => Response::ProbeFile { success: false },
            RequestKind::ReadMetadata => Response::ReadMetadata {
                metadata: TrackMetadata::default(),
            },
            RequestKind::WriteMetadata => Response::WriteMetadata { success: false },
            RequestKind::ReadEmbeddedArt => Response::ReadEmbeddedArt { data: Vec::new() },
            RequestKind::WriteEmbeddedArt => Response::WriteEmbeddedArt { success: false },
            RequestKind::WritePlaycount => Response::WritePlaycount { success: false },
            RequestKind::WriteRating => Response::WriteRating { success: false },
        }
    }

    /// Variant this reply answers; `None` for [`Response::Empty`].
    pub fn kind(&self) -> Option<RequestKind> {
        match self {
            Response::Empty => None,
            Response::ProbeFile { .. } => Some(RequestKind::ProbeFile),
            Response::ReadMetadata { .. } => Some(RequestKind::ReadMetadata),
            Response::WriteMetadata { .. } => Some(RequestKind::WriteMetadata),
            Response::ReadEmbeddedArt { .. } => Some(RequestKind::ReadEmbeddedArt),
            Response::WriteEmbeddedArt { .. } => Some(RequestKind::WriteEmbeddedArt),
            Response::WritePlaycount { .. } => Some(RequestKind::WritePlaycount),
            Response::WriteRating { .. } => Some(RequestKind::WriteRating),
        }
    }

    /// Boolean outcome, for the variants that carry one.
    pub fn success(&self) -> Option<bool> {
        match self {
            Response::ProbeFile { success }
            | Response::WriteMetadata { success }
            | Response::WriteEmbeddedArt { success }
            | Response::WritePlaycount { success }
            | Response::WriteRating { success } => Some(*success),
            _ => None,
        }
    }
}

// ============================================================================
// Line codec
// ============================================================================

/// Decode one line into a request envelope.
///
/// Never fails: anything that can't be understood becomes an empty (or
/// unknown) request, which still gets exactly one reply.
pub fn decode_request(line: &str) -> RequestEnvelope {
    let value: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "malformed frame; treating as empty request");
            return RequestEnvelope {
                id: 0,
                request: None,
            };
        }
    };

    let id = envelope_id(&value);

    let request = match value.get("request") {
        None | Some(Value::Null) => None,
        Some(raw) => match Request::deserialize(raw) {
            Ok(r) => Some(r),
            Err(e) => {
                tracing::warn!(id, error = %e, "undecodable request payload");
                Some(Request::Unknown)
            }
        },
    };

    RequestEnvelope { id, request }
}

/// The envelope id; 0 when absent or not an unsigned integer.
fn envelope_id(value: &Value) -> u64 {
    match value.get("id") {
        None | Some(Value::Null) => 0,
        Some(raw) => raw.as_u64().unwrap_or_else(|| {
            tracing::warn!(id = %raw, "request id is not an unsigned integer; replying with id 0");
            0
        }),
    }
}

/// Encode a reply as one line (no trailing newline).
pub fn encode_response(envelope: &ResponseEnvelope) -> WorkerResult<String> {
    serde_json::to_string(envelope).map_err(WorkerError::EncodeFailed)
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD
            .decode(s.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_probe_request() {
        let env = decode_request(r#"{"id":7,"request":{"type":"probe_file","path":"/m/a.mp3"}}"#);
        assert_eq!(env.id, 7);
        assert_eq!(
            env.request,
            Some(Request::ProbeFile {
                path: PathBuf::from("/m/a.mp3")
            })
        );
    }

    #[test]
    fn decodes_write_with_metadata() {
        let env = decode_request(
            r#"{"id":1,"request":{"type":"write_rating","path":"x.mp3","metadata":{"rating":0.5}}}"#,
        );
        match env.request {
            Some(Request::WriteRating { metadata, .. }) => assert_eq!(metadata.rating, Some(0.5)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn art_bytes_are_base64() {
        let env = decode_request(
            r#"{"id":2,"request":{"type":"write_embedded_art","path":"x.mp3","data":"AAEC"}}"#,
        );
        match env.request {
            Some(Request::WriteEmbeddedArt { data, .. }) => assert_eq!(data, vec![0, 1, 2]),
            other => panic!("unexpected {other:?}"),
        }

        let line = encode_response(&ResponseEnvelope {
            id: 2,
            response: Response::ReadEmbeddedArt {
                data: vec![0, 1, 2],
            },
        })
        .unwrap();
        assert_eq!(
            line,
            r#"{"id":2,"response":{"type":"read_embedded_art","data":"AAEC"}}"#
        );
    }

    #[test]
    fn empty_and_unknown_requests() {
        assert_eq!(decode_request(r#"{"id":3}"#).request, None);
        assert_eq!(decode_request(r#"{"id":3,"request":null}"#).request, None);
        assert_eq!(
            decode_request(r#"{"id":4,"request":{"type":"transcode","path":"a"}}"#).request,
            Some(Request::Unknown)
        );
        // known type, missing payload
        let env = decode_request(r#"{"id":5,"request":{"type":"probe_file"}}"#);
        assert_eq!(env.id, 5);
        assert_eq!(env.request, Some(Request::Unknown));
    }

    #[test]
    fn garbage_is_an_empty_request() {
        let env = decode_request("not json at all");
        assert_eq!(env.id, 0);
        assert_eq!(env.request, None);
    }

    #[test]
    fn uncorrelatable_ids_fall_back_to_zero() {
        for line in [
            r#"{"id":"seven","request":{"type":"probe_file","path":"a"}}"#,
            r#"{"id":-3,"request":{"type":"probe_file","path":"a"}}"#,
            r#"{"id":1.5,"request":{"type":"probe_file","path":"a"}}"#,
        ] {
            let env = decode_request(line);
            assert_eq!(env.id, 0, "{line}");
            // The request itself is still served.
            assert!(matches!(env.request, Some(Request::ProbeFile { .. })));
        }
        assert_eq!(decode_request(r#"{"id":null}"#).id, 0);
        assert_eq!(decode_request(r#"{"id":18446744073709551615}"#).id, u64::MAX);
    }

    #[test]
    fn empty_response_encoding() {
        let line = encode_response(&ResponseEnvelope {
            id: 9,
            response: Response::default(),
        })
        .unwrap();
        assert_eq!(line, r#"{"id":9,"response":{"type":"empty"}}"#);
    }

    #[test]
    fn empty_for_matches_kind() {
        for kind in [
            RequestKind::ProbeFile,
            RequestKind::ReadMetadata,
            RequestKind::WriteMetadata,
            RequestKind::ReadEmbeddedArt,
            RequestKind::WriteEmbeddedArt,
            RequestKind::WritePlaycount,
            RequestKind::WriteRating,
        ] {
            assert_eq!(Response::empty_for(kind).kind(), Some(kind));
        }
        assert_eq!(Response::Empty.kind(), None);
    }
}
