//! Entry point for `bears-sender`.
//!
//! Parses CLI arguments, opens the input and the socket, and hands both to
//! [`bears_sender::Sender`].  `main.rs` owns only process setup (logging,
//! signal handling, argument parsing).

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncRead;

use bears_sender::config::DEFAULT_PORT;
use bears_sender::{Sender, SenderConfig, Socket};

/// BEARS-TP sender: reliable file transfer over UDP.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// The file to transfer; reads from stdin when omitted.
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// The destination port.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// The receiver address or hostname.
    #[arg(short, long, default_value = "localhost")]
    address: String,

    /// Print debug messages.
    #[arg(short, long)]
    debug: bool,

    /// Enable selective acknowledgement mode.
    #[arg(short = 'k', long)]
    sack: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over --debug when both are given.
    let default_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    tokio::select! {
        result = transfer(cli) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("{e:#}");
                ExitCode::FAILURE
            }
        },
        () = interrupted(tokio::signal::ctrl_c()) => {
            log::warn!("interrupted; transfer aborted");
            ExitCode::from(130)
        }
    }
}

/// Resolves when `signal` reports an interrupt.  A failure to install the
/// handler leaves the transfer running without Ctrl-C support.
async fn interrupted<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => {}
        Err(e) => {
            log::warn!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    }
}

async fn transfer(cli: Cli) -> Result<()> {
    let input: Box<dyn AsyncRead + Unpin + Send> = match &cli.file {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };

    let socket = Socket::connect(&cli.address, cli.port)
        .await
        .with_context(|| format!("connecting to {}:{}", cli.address, cli.port))?;
    log::info!("Sending to {} from {}", socket.peer, socket.local_addr);

    let mut sender = Sender::new(socket, SenderConfig::with_sack_mode(cli.sack));
    sender.run(input).await.context("transfer failed")?;
    Ok(())
}
