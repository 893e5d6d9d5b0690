//! Daemon mode for captionq - owns the scheduler and serves IPC commands.

pub mod handler;

use crate::config::Config;
use crate::engine::mock::{MockImageRecognizer, MockSpeechRecognizer, MockTranslator};
use crate::engine::remote::{
    RemoteImageRecognizer, RemoteOcrConfig, RemoteSpeechConfig, RemoteSpeechRecognizer,
    RemoteTranslator, RemoteTranslatorConfig,
};
use crate::error::{CaptionqError, Result};
use crate::ipc::server::IpcServer;
use crate::pipeline::JobPipeline;
use crate::scheduler::Scheduler;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;

/// Daemon state: the scheduler plus the shutdown signal.
pub struct DaemonState {
    pub scheduler: Scheduler,
    /// Notified by the Shutdown command.
    pub shutdown: Notify,
}

impl DaemonState {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            shutdown: Notify::new(),
        }
    }
}

/// Run the daemon: build the pipeline, start the IPC server, wait for
/// shutdown.
///
/// # Arguments
/// * `config` - Configuration
/// * `socket_path` - Path to Unix socket for IPC
/// * `quiet` - Suppress status messages
/// * `verbosity` - Verbosity level
/// * `mock` - Use mock engines instead of remote ones (offline mode)
pub async fn run_daemon(
    config: Config,
    socket_path: Option<PathBuf>,
    quiet: bool,
    verbosity: u8,
    mock: bool,
) -> Result<()> {
    let pipeline = build_pipeline(&config, mock);
    if !quiet && mock {
        eprintln!("Using mock engines (offline mode).");
    }

    let scheduler = Scheduler::new(Arc::new(pipeline));
    let state = Arc::new(DaemonState::new(scheduler));

    // Determine socket path
    let socket_path = socket_path.unwrap_or_else(IpcServer::default_socket_path);

    // Create IPC server
    let server = Arc::new(IpcServer::new(socket_path)?);

    if !quiet {
        eprintln!(
            "IPC server listening at: {}",
            server.socket_path().display()
        );
        eprintln!("Daemon ready.");
    }

    // Create command handler
    let command_handler =
        handler::DaemonCommandHandler::new(Arc::clone(&state), quiet, verbosity);

    // Start IPC server in background task
    let server_clone = Arc::clone(&server);
    let server_handle = tokio::spawn(async move { server_clone.start(command_handler).await });

    // Wait for SIGTERM, SIGINT, or a Shutdown command
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            if !quiet {
                eprintln!("\nReceived SIGINT, shutting down...");
            }
        }
        res = wait_for_sigterm() => {
            if let Err(e) = res {
                eprintln!("Error setting up signal handler: {}", e);
            }
            if !quiet {
                eprintln!("\nReceived SIGTERM, shutting down...");
            }
        }
        _ = state.shutdown.notified() => {
            if !quiet {
                eprintln!("Shutdown requested, shutting down...");
            }
        }
    }

    // Stop IPC server
    server.stop().await?;

    // Wait for server task to finish
    if let Err(e) = server_handle.await {
        eprintln!("captionq: daemon server task failed: {e}");
    }

    if !quiet {
        eprintln!("Daemon stopped.");
    }

    Ok(())
}

/// Wait for SIGTERM signal (used by systemd).
#[cfg(unix)]
async fn wait_for_sigterm() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| CaptionqError::Other(format!("Failed to register SIGTERM handler: {}", e)))?;
    sigterm.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_sigterm() -> Result<()> {
    // On non-Unix, just wait forever (Ctrl+C will still work)
    std::future::pending::<()>().await
}

/// Build the job pipeline from config.
fn build_pipeline(config: &Config, mock: bool) -> JobPipeline {
    let options = config.pipeline_options();

    if mock {
        return JobPipeline::new(
            Arc::new(MockSpeechRecognizer::new()),
            Arc::new(MockImageRecognizer::new()),
            Arc::new(MockTranslator::tagging()),
            options,
        );
    }

    let api_key = config.engine.api_key();
    let speech = RemoteSpeechRecognizer::new(RemoteSpeechConfig {
        base_url: config.engine.speech_url.clone(),
        api_key: api_key.clone(),
        model: config.engine.speech_model.clone(),
    });
    let image = RemoteImageRecognizer::new(RemoteOcrConfig {
        url: config.engine.ocr_url.clone(),
        api_key: api_key.clone(),
    });
    let translator = RemoteTranslator::new(RemoteTranslatorConfig {
        url: config.translation.url.clone(),
        api_key,
    });

    JobPipeline::new(Arc::new(speech), Arc::new(image), Arc::new(translator), options)
}
