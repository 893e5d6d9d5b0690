//! Command handler implementation for the daemon.

use crate::daemon::DaemonState;
use crate::error::Result;
use crate::ipc::protocol::{Command, MediaKind, Response};
use crate::ipc::server::{CommandHandler, Reply};
use crate::job::{Artifact, JobMode, JobRequest, TempArtifact};
use crate::ocr::pages::check_page_count;
use crate::render::{progress_message, queue_message};
use crate::scheduler::{JobEvent, JobHandle};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Command handler for daemon IPC commands.
pub struct DaemonCommandHandler {
    state: Arc<DaemonState>,
    quiet: bool,
    verbosity: u8,
}

impl DaemonCommandHandler {
    /// Creates a new command handler.
    pub fn new(state: Arc<DaemonState>, quiet: bool, verbosity: u8) -> Self {
        Self {
            state,
            quiet,
            verbosity,
        }
    }

    /// Build the job artifact from the submitted file paths.
    ///
    /// Validation happens here, before the scheduler: an invalid request
    /// is reported immediately and never touches the queue or the gate.
    fn build_artifact(media: MediaKind, paths: &[PathBuf]) -> Result<Artifact> {
        match media {
            MediaKind::Speech => {
                if paths.len() != 1 {
                    return Err(crate::error::CaptionqError::InvalidMode {
                        message: format!(
                            "speech submissions take exactly one file, got {}",
                            paths.len()
                        ),
                    });
                }
                Ok(Artifact::Audio(TempArtifact::from_file(&paths[0])?))
            }
            MediaKind::Pages => {
                if paths.is_empty() {
                    return Err(crate::error::CaptionqError::EmptyArtifact);
                }
                check_page_count(paths.len())?;
                let mut pages = Vec::with_capacity(paths.len());
                for path in paths {
                    pages.push(TempArtifact::from_file(path)?);
                }
                Ok(Artifact::Pages(pages))
            }
        }
    }

    async fn submit(
        &self,
        media: MediaKind,
        paths: Vec<PathBuf>,
        mode: JobMode,
        target_lang: Option<String>,
        page_range: Option<String>,
    ) -> Reply {
        let artifact = match Self::build_artifact(media, &paths) {
            Ok(artifact) => artifact,
            Err(e) => {
                return Reply::Single(Response::Error {
                    message: e.user_message(),
                });
            }
        };

        let request = JobRequest {
            artifact,
            target_lang,
            mode,
            page_range,
        };

        let handle = match self.state.scheduler.submit(request) {
            Ok(handle) => handle,
            Err(e) => {
                return Reply::Single(Response::Error {
                    message: e.user_message(),
                });
            }
        };

        if self.verbosity >= 1 {
            eprintln!(
                "Job {} submitted (position {})",
                handle.id(),
                handle.position()
            );
        }

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(forward_events(handle, tx, self.quiet));
        Reply::Stream(rx)
    }
}

/// Translate scheduler events into protocol responses until the job
/// reaches a terminal state or the client goes away.
async fn forward_events(
    mut handle: JobHandle,
    tx: mpsc::UnboundedSender<Response>,
    quiet: bool,
) {
    let id = handle.id();
    while let Some(event) = handle.next_event().await {
        let response = match event {
            JobEvent::Queued { position } => Response::Accepted {
                id,
                position,
                message: queue_message(position),
            },
            JobEvent::Started => Response::Started { id },
            JobEvent::Progress { phase } => Response::Progress {
                id,
                phase,
                percent: phase.percent(),
                message: progress_message(phase),
            },
            JobEvent::Done { output } => {
                if !quiet {
                    eprintln!("Job {id} done");
                }
                Response::Done {
                    id,
                    text: output.text,
                    sync: output.sync,
                }
            }
            JobEvent::Failed { kind, message } => {
                if !quiet {
                    eprintln!("Job {id} failed ({kind:?}): {message}");
                }
                Response::Failed { id, kind, message }
            }
            JobEvent::Cancelled => Response::Cancelled { id },
        };

        let terminal = response.is_terminal();
        if tx.send(response).is_err() {
            // Client disconnected; the job itself keeps its own course.
            break;
        }
        if terminal {
            break;
        }
    }
}

#[async_trait::async_trait]
impl CommandHandler for DaemonCommandHandler {
    async fn handle(&self, command: Command) -> Reply {
        match command {
            Command::Submit {
                media,
                paths,
                mode,
                target_lang,
                page_range,
            } => {
                self.submit(media, paths, mode, target_lang, page_range)
                    .await
            }
            Command::Cancel { id } => {
                if self.state.scheduler.cancel(id) {
                    Reply::Single(Response::Ok)
                } else {
                    Reply::Single(Response::Error {
                        message: format!("Unknown job {id} (already finished?)"),
                    })
                }
            }
            Command::Status => Reply::Single(Response::Status {
                waiting: self.state.scheduler.waiting(),
                running: self.state.scheduler.is_running(),
            }),
            Command::Shutdown => {
                self.state.shutdown.notify_one();
                Reply::Single(Response::Ok)
            }
        }
    }
}
