//! Async Unix socket IPC server for daemon control.

use crate::error::{CaptionqError, Result};
use crate::ipc::protocol::{Command, Response};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Mutex, mpsc};

/// What a handler produces for one command: a single response, or a
/// stream of responses (submissions report progress over time).
pub enum Reply {
    Single(Response),
    Stream(mpsc::UnboundedReceiver<Response>),
}

/// Handler trait for processing IPC commands.
#[async_trait::async_trait]
pub trait CommandHandler: Send + Sync {
    /// Handle a command and return its reply.
    async fn handle(&self, command: Command) -> Reply;
}

/// State for managing server shutdown.
#[derive(Debug, Clone)]
struct ServerState {
    shutdown: Arc<Mutex<bool>>,
}

impl ServerState {
    fn new() -> Self {
        Self {
            shutdown: Arc::new(Mutex::new(false)),
        }
    }

    async fn is_shutdown(&self) -> bool {
        *self.shutdown.lock().await
    }

    async fn set_shutdown(&self) {
        *self.shutdown.lock().await = true;
    }
}

/// IPC server for handling daemon control commands via Unix socket.
pub struct IpcServer {
    socket_path: PathBuf,
    state: ServerState,
}

impl IpcServer {
    /// Create a new IPC server bound to the specified socket path.
    pub fn new(socket_path: PathBuf) -> Result<Self> {
        Ok(Self {
            socket_path,
            state: ServerState::new(),
        })
    }

    /// Get the socket path this server is using.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Get the default socket path based on XDG_RUNTIME_DIR or fallback.
    pub fn default_socket_path() -> PathBuf {
        if let Ok(xdg_runtime) = std::env::var("XDG_RUNTIME_DIR") {
            PathBuf::from(xdg_runtime).join("captionq.sock")
        } else {
            let user = std::env::var("USER").unwrap_or_else(|_| "default".to_string());
            std::env::temp_dir().join(format!("captionq-{}.sock", user))
        }
    }

    /// Start the IPC server and handle incoming connections.
    pub async fn start<H>(&self, handler: H) -> Result<()>
    where
        H: CommandHandler + 'static,
    {
        // Clean up any existing socket file
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(|e| CaptionqError::IpcSocket {
                message: format!("Failed to remove existing socket: {}", e),
            })?;
        }

        // Bind to the socket
        let listener =
            UnixListener::bind(&self.socket_path).map_err(|e| CaptionqError::IpcSocket {
                message: format!("Failed to bind to socket: {}", e),
            })?;

        let handler = Arc::new(handler);

        loop {
            // Check if shutdown was requested
            if self.state.is_shutdown().await {
                break;
            }

            // Accept connection with timeout to check for shutdown
            let accept_result =
                tokio::time::timeout(tokio::time::Duration::from_millis(100), listener.accept())
                    .await;

            match accept_result {
                Ok(Ok((stream, _))) => {
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, handler).await {
                            eprintln!("Error handling client: {}", e);
                        }
                    });
                }
                Ok(Err(e)) => {
                    return Err(CaptionqError::IpcConnection {
                        message: format!("Failed to accept connection: {}", e),
                    });
                }
                Err(_) => {
                    // Timeout - check shutdown flag again
                    continue;
                }
            }
        }

        Ok(())
    }

    /// Stop the IPC server and clean up the socket file.
    pub async fn stop(&self) -> Result<()> {
        self.state.set_shutdown().await;

        // Clean up socket file
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path).map_err(|e| CaptionqError::IpcSocket {
                message: format!("Failed to remove socket file: {}", e),
            })?;
        }

        Ok(())
    }
}

/// Handle a single client connection: one command line in, one or more
/// response lines out.
async fn handle_client<H>(stream: UnixStream, handler: Arc<H>) -> Result<()>
where
    H: CommandHandler,
{
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    reader
        .read_line(&mut line)
        .await
        .map_err(|e| CaptionqError::IpcConnection {
            message: format!("Failed to read from client: {}", e),
        })?;

    // A malformed command still gets a response, so the caller sees the
    // validation failure instead of a silent hangup.
    let command = match Command::from_json(line.trim()) {
        Ok(command) => command,
        Err(e) => {
            let response = Response::Error {
                message: format!("Invalid command: {}", e),
            };
            write_response(&mut writer, &response).await?;
            return Ok(());
        }
    };

    match handler.handle(command).await {
        Reply::Single(response) => {
            write_response(&mut writer, &response).await?;
        }
        Reply::Stream(mut responses) => {
            while let Some(response) = responses.recv().await {
                let terminal = response.is_terminal();
                write_response(&mut writer, &response).await?;
                if terminal {
                    break;
                }
            }
        }
    }

    writer
        .flush()
        .await
        .map_err(|e| CaptionqError::IpcConnection {
            message: format!("Failed to flush writer: {}", e),
        })?;

    Ok(())
}

async fn write_response(
    writer: &mut tokio::net::unix::OwnedWriteHalf,
    response: &Response,
) -> Result<()> {
    let json = response
        .to_json()
        .map_err(|e| CaptionqError::IpcProtocol {
            message: format!("Failed to serialize response: {}", e),
        })?;

    writer
        .write_all(json.as_bytes())
        .await
        .map_err(|e| CaptionqError::IpcConnection {
            message: format!("Failed to write to client: {}", e),
        })?;

    writer
        .write_all(b"\n")
        .await
        .map_err(|e| CaptionqError::IpcConnection {
            message: format!("Failed to write newline to client: {}", e),
        })?;

    Ok(())
}
