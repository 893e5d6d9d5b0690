use anyhow::Result;
use captionq::cli::{Cli, Commands};
use captionq::config::Config;
use captionq::daemon::run_daemon;
use captionq::ipc::client::{send_command, send_command_with};
use captionq::ipc::protocol::{Command, MediaKind, Response};
use captionq::ipc::server::IpcServer;
use captionq::job::JobMode;
use clap::Parser;
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon {
            socket,
            mock,
            timeout,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(secs) = timeout {
                config.scheduler.recognition_timeout_secs = secs;
            }
            run_daemon(config, socket, cli.quiet, cli.verbose, mock).await?;
        }
        Commands::Submit {
            file,
            lang,
            whole,
            sync_out,
            socket,
        } => {
            let command = Command::Submit {
                media: MediaKind::Speech,
                paths: vec![file],
                mode: if whole {
                    JobMode::Whole
                } else {
                    JobMode::Timestamped
                },
                target_lang: lang,
                page_range: None,
            };
            run_submit(socket, command, sync_out, cli.quiet).await?;
        }
        Commands::Scan {
            files,
            pages,
            socket,
        } => {
            let command = Command::Submit {
                media: MediaKind::Pages,
                paths: files,
                mode: JobMode::Whole,
                target_lang: None,
                page_range: pages,
            };
            run_submit(socket, command, None, cli.quiet).await?;
        }
        Commands::Status { socket } => {
            let responses = send_command(&resolve_socket(socket), &Command::Status).await?;
            for response in responses {
                match response {
                    Response::Status { waiting, running } => {
                        let state = if running { "one job running" } else { "idle" };
                        println!("{waiting} job(s) in queue; {state}");
                    }
                    Response::Error { message } => anyhow::bail!(message),
                    _ => {}
                }
            }
        }
        Commands::Cancel { id, socket } => {
            let responses =
                send_command(&resolve_socket(socket), &Command::Cancel { id }).await?;
            for response in responses {
                match response {
                    Response::Ok => println!("Job {id} cancelled."),
                    Response::Error { message } => anyhow::bail!(message),
                    _ => {}
                }
            }
        }
        Commands::Shutdown { socket } => {
            send_command(&resolve_socket(socket), &Command::Shutdown).await?;
            if !cli.quiet {
                eprintln!("Shutdown requested.");
            }
        }
    }

    Ok(())
}

/// Submit a job and stream its lifecycle to the terminal.
async fn run_submit(
    socket: Option<PathBuf>,
    command: Command,
    sync_out: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let socket_path = resolve_socket(socket);

    let terminal = send_command_with(&socket_path, &command, |response| {
        if quiet {
            return;
        }
        match response {
            Response::Accepted { id, message, .. } => eprintln!("Job {id}: {message}"),
            Response::Started { .. } => eprintln!("Running..."),
            Response::Progress { message, .. } => eprintln!("{message}"),
            _ => {}
        }
    })
    .await?;

    match terminal {
        Response::Done { text, sync, .. } => {
            print!("{text}");
            if let Some(path) = sync_out {
                match sync {
                    Some(document) => std::fs::write(&path, document.to_json()?)?,
                    None => eprintln!("No sync document for this mode; nothing written."),
                }
            }
            Ok(())
        }
        Response::Cancelled { id } => {
            eprintln!("Job {id} was cancelled before it started.");
            Ok(())
        }
        Response::Failed { message, .. } | Response::Error { message } => {
            anyhow::bail!(message)
        }
        other => anyhow::bail!("unexpected response from daemon: {other:?}"),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load(path)?,
        None => match Config::default_path() {
            Some(path) => Config::load_or_default(&path)?,
            None => Config::default(),
        },
    };
    Ok(config.with_env_overrides())
}

fn resolve_socket(socket: Option<PathBuf>) -> PathBuf {
    socket.unwrap_or_else(IpcServer::default_socket_path)
}
