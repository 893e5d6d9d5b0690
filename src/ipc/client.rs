//! IPC client for sending commands to the daemon.

use crate::error::{CaptionqError, Result};
use crate::ipc::protocol::{Command, Response};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

/// Send a command and invoke the callback on each response line as it
/// arrives. Returns the terminal response.
///
/// Submissions stream queue position and progress before their terminal
/// response; all other commands produce exactly one line.
pub async fn send_command_with<F>(
    socket_path: &Path,
    command: &Command,
    mut on_response: F,
) -> Result<Response>
where
    F: FnMut(&Response),
{
    let stream =
        UnixStream::connect(socket_path)
            .await
            .map_err(|e| CaptionqError::IpcConnection {
                message: format!(
                    "Failed to connect to daemon at {}: {} (is the daemon running?)",
                    socket_path.display(),
                    e
                ),
            })?;

    let (reader, mut writer) = stream.into_split();

    let json = command.to_json().map_err(|e| CaptionqError::IpcProtocol {
        message: format!("Failed to serialize command: {}", e),
    })?;
    writer
        .write_all(format!("{}\n", json).as_bytes())
        .await
        .map_err(|e| CaptionqError::IpcConnection {
            message: format!("Failed to send command: {}", e),
        })?;
    writer
        .flush()
        .await
        .map_err(|e| CaptionqError::IpcConnection {
            message: format!("Failed to flush command: {}", e),
        })?;

    let mut lines = BufReader::new(reader).lines();
    let mut last = None;

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| CaptionqError::IpcConnection {
            message: format!("Failed to read response: {}", e),
        })?
    {
        if line.trim().is_empty() {
            continue;
        }
        let response =
            Response::from_json(line.trim()).map_err(|e| CaptionqError::IpcProtocol {
                message: format!("Failed to parse response: {}", e),
            })?;
        on_response(&response);
        let terminal = response.is_terminal();
        last = Some(response);
        if terminal {
            break;
        }
    }

    last.ok_or_else(|| CaptionqError::IpcConnection {
        message: "Daemon closed the connection without responding".to_string(),
    })
}

/// Send a command and collect every response.
pub async fn send_command(socket_path: &Path, command: &Command) -> Result<Vec<Response>> {
    let mut responses = Vec::new();
    send_command_with(socket_path, command, |response| {
        responses.push(response.clone());
    })
    .await?;
    Ok(responses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::server::{CommandHandler, IpcServer, Reply};
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    struct EchoHandler;

    #[async_trait::async_trait]
    impl CommandHandler for EchoHandler {
        async fn handle(&self, command: Command) -> Reply {
            match command {
                Command::Status => Reply::Single(Response::Status {
                    waiting: 3,
                    running: true,
                }),
                Command::Submit { .. } => {
                    let (tx, rx) = mpsc::unbounded_channel();
                    let _ = tx.send(Response::Accepted {
                        id: 1,
                        position: 2,
                        message: "Queued: 2 jobs ahead of you.".to_string(),
                    });
                    let _ = tx.send(Response::Done {
                        id: 1,
                        text: "done".to_string(),
                        sync: None,
                    });
                    Reply::Stream(rx)
                }
                _ => Reply::Single(Response::Ok),
            }
        }
    }

    async fn start_server(socket_path: std::path::PathBuf) {
        tokio::spawn(async move {
            let server = IpcServer::new(socket_path).unwrap();
            server.start(EchoHandler).await
        });
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn connect_failure_mentions_daemon() {
        let result = send_command(Path::new("/nonexistent/captionq.sock"), &Command::Status).await;
        match result {
            Err(CaptionqError::IpcConnection { message }) => {
                assert!(message.contains("is the daemon running?"));
            }
            other => panic!("expected IpcConnection error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn single_response_command() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("client-test.sock");
        start_server(socket_path.clone()).await;

        let responses = send_command(&socket_path, &Command::Status).await.unwrap();
        assert_eq!(responses.len(), 1);
        assert!(matches!(
            responses[0],
            Response::Status {
                waiting: 3,
                running: true
            }
        ));
    }

    #[tokio::test]
    async fn streaming_command_returns_terminal_response() {
        let temp_dir = TempDir::new().unwrap();
        let socket_path = temp_dir.path().join("client-test.sock");
        start_server(socket_path.clone()).await;

        let command = Command::Submit {
            media: crate::ipc::protocol::MediaKind::Speech,
            paths: vec![std::path::PathBuf::from("/tmp/a.wav")],
            mode: crate::job::JobMode::Timestamped,
            target_lang: None,
            page_range: None,
        };

        let mut seen = Vec::new();
        let terminal = send_command_with(&socket_path, &command, |r| {
            seen.push(r.clone());
        })
        .await
        .unwrap();

        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0], Response::Accepted { position: 2, .. }));
        assert!(matches!(terminal, Response::Done { .. }));
    }
}
