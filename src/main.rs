//! Sonora tag reader worker.
//!
//! Started by the host with its stdin/stdout (or a Unix socket) as the channel.
//! Lives for as many requests as the host sends; the process ends the moment
//! the channel closes.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sonora_tagreader::config::{Cli, Transport, WorkerConfig};
use sonora_tagreader::error::WorkerResult;
use sonora_tagreader::worker::{Channel, LineChannel, Worker};

fn main() -> ExitCode {
    let config = WorkerConfig::from(Cli::parse());

    // stdout may be the channel, so logs always go to stderr.
    let env_filter =
        EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&config) {
        Ok(handled) => {
            tracing::info!(handled, "channel closed, exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "worker failed to start");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &WorkerConfig) -> WorkerResult<u64> {
    match &config.transport {
        Transport::Stdio => Ok(serve(config, LineChannel::stdio())),
        #[cfg(unix)]
        Transport::UnixSocket(path) => {
            tracing::info!(socket = %path.display(), "connecting to host");
            Ok(serve(config, LineChannel::connect_unix(path)?))
        }
        #[cfg(not(unix))]
        Transport::UnixSocket(path) => Err(sonora_tagreader::error::WorkerError::ConnectFailed {
            path: path.display().to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "Unix sockets are not available on this platform",
            ),
        }),
    }
}

fn serve<C: Channel>(config: &WorkerConfig, channel: C) -> u64 {
    let (primary, fallback) = config.providers();
    Worker::new(channel, primary, fallback).run()
}
