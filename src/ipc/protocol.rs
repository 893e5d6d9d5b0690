//! JSON message protocol for IPC communication between CLI and daemon.

use crate::error::ErrorKind;
use crate::job::{JobId, JobMode, JobPhase};
use crate::render::SyncDocument;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What kind of media a submission carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// A single speech recording.
    Speech,
    /// One or more scanned page images.
    Pages,
}

/// Commands sent by the CLI to the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Submit a recognition job
    Submit {
        media: MediaKind,
        paths: Vec<PathBuf>,
        mode: JobMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_lang: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page_range: Option<String>,
    },
    /// Cancel a queued job
    Cancel { id: JobId },
    /// Get daemon status
    Status,
    /// Shutdown the daemon
    Shutdown,
}

impl Command {
    /// Serialize command to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize command from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Responses sent by the daemon. A submission produces a stream of these
/// (Accepted, then progress, then one terminal response); other commands
/// produce exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Job registered; `message` is the human-readable queue position
    Accepted {
        id: JobId,
        position: usize,
        message: String,
    },
    /// Job acquired the execution slot
    Started { id: JobId },
    /// Coarse progress while the job runs
    Progress {
        id: JobId,
        phase: JobPhase,
        percent: u8,
        message: String,
    },
    /// Job finished; `sync` carries the playback document for
    /// timestamped output
    Done {
        id: JobId,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sync: Option<SyncDocument>,
    },
    /// Job failed; `kind` distinguishes engine, validation, and internal
    /// failures
    Failed {
        id: JobId,
        kind: ErrorKind,
        message: String,
    },
    /// Job was cancelled before admission
    Cancelled { id: JobId },
    /// Current daemon status
    Status { waiting: usize, running: bool },
    /// Command succeeded
    Ok,
    /// Command-level error (not tied to a job)
    Error { message: String },
}

impl Response {
    /// Serialize response to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize response from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// True once no further responses will follow for this submission.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Response::Done { .. }
                | Response::Failed { .. }
                | Response::Cancelled { .. }
                | Response::Status { .. }
                | Response::Ok
                | Response::Error { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_submit_json_round_trip() {
        let cmd = Command::Submit {
            media: MediaKind::Speech,
            paths: vec![PathBuf::from("/tmp/song.mp3")],
            mode: JobMode::Timestamped,
            target_lang: Some("es".to_string()),
            page_range: None,
        };
        let json = cmd.to_json().expect("should serialize");
        let deserialized = Command::from_json(&json).expect("should deserialize");
        assert_eq!(cmd, deserialized);
    }

    #[test]
    fn command_all_variants_serialize() {
        let commands = vec![
            Command::Submit {
                media: MediaKind::Pages,
                paths: vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")],
                mode: JobMode::Whole,
                target_lang: None,
                page_range: Some("1-2".to_string()),
            },
            Command::Cancel { id: 7 },
            Command::Status,
            Command::Shutdown,
        ];

        for cmd in commands {
            let json = cmd.to_json().expect("should serialize");
            let deserialized = Command::from_json(&json).expect("should deserialize");
            assert_eq!(cmd, deserialized, "roundtrip failed for {:?}", cmd);
        }
    }

    #[test]
    fn json_format_is_snake_case() {
        let json = Command::Status.to_json().expect("should serialize");
        assert_eq!(json, r#"{"type":"status"}"#);

        let json = Command::Cancel { id: 3 }.to_json().expect("should serialize");
        assert!(json.contains(r#""type":"cancel""#), "got: {}", json);
    }

    #[test]
    fn submit_omits_absent_optionals() {
        let cmd = Command::Submit {
            media: MediaKind::Speech,
            paths: vec![PathBuf::from("x.wav")],
            mode: JobMode::Timestamped,
            target_lang: None,
            page_range: None,
        };
        let json = cmd.to_json().expect("should serialize");
        assert!(!json.contains("target_lang"));
        assert!(!json.contains("page_range"));
    }

    #[test]
    fn response_accepted_round_trip() {
        let resp = Response::Accepted {
            id: 1,
            position: 2,
            message: "Queued: 2 jobs ahead of you.".to_string(),
        };
        let json = resp.to_json().expect("should serialize");
        let deserialized = Response::from_json(&json).expect("should deserialize");
        assert_eq!(resp, deserialized);
        assert!(json.contains(r#""type":"accepted""#));
        assert!(json.contains(r#""position":2"#));
    }

    #[test]
    fn response_progress_round_trip() {
        let resp = Response::Progress {
            id: 1,
            phase: JobPhase::Recognizing,
            percent: 40,
            message: "Recognizing... 40%".to_string(),
        };
        let json = resp.to_json().expect("should serialize");
        assert!(json.contains(r#""phase":"recognizing""#));
        let deserialized = Response::from_json(&json).expect("should deserialize");
        assert_eq!(resp, deserialized);
    }

    #[test]
    fn response_failed_carries_error_kind() {
        let resp = Response::Failed {
            id: 4,
            kind: ErrorKind::Validation,
            message: "Your input was invalid: bad range".to_string(),
        };
        let json = resp.to_json().expect("should serialize");
        assert!(json.contains(r#""kind":"validation""#));
        let deserialized = Response::from_json(&json).expect("should deserialize");
        assert_eq!(resp, deserialized);
    }

    #[test]
    fn response_done_with_sync_document_round_trips() {
        use crate::transcript::CaptionLine;

        let resp = Response::Done {
            id: 9,
            text: "[00:00] Hello world\n".to_string(),
            sync: Some(SyncDocument::new(vec![CaptionLine::new(
                0.0,
                1.0,
                "Hello world",
            )])),
        };
        let json = resp.to_json().expect("should serialize");
        let deserialized = Response::from_json(&json).expect("should deserialize");
        assert_eq!(resp, deserialized);
    }

    #[test]
    fn terminal_classification() {
        assert!(Response::Ok.is_terminal());
        assert!(
            Response::Done {
                id: 1,
                text: String::new(),
                sync: None
            }
            .is_terminal()
        );
        assert!(
            Response::Cancelled { id: 1 }.is_terminal()
        );
        assert!(!Response::Started { id: 1 }.is_terminal());
        assert!(
            !Response::Accepted {
                id: 1,
                position: 0,
                message: String::new()
            }
            .is_terminal()
        );
    }

    #[test]
    fn invalid_json_returns_error() {
        assert!(Command::from_json(r#"{"type": "unknown_command"}"#).is_err());
        assert!(Command::from_json(r#"{"invalid": "json"}"#).is_err());
        assert!(Command::from_json("not json at all").is_err());
    }
}
