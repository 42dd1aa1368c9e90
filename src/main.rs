use std::io::Write;
use std::sync::Arc;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use futures::StreamExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use tarot_stream::adapters::ReqwestHttpClient;
use tarot_stream::cli::{parse_args, version_line, CliCommand, USAGE};
use tarot_stream::config::ReadingConfig;
use tarot_stream::error::ReadingResult;
use tarot_stream::models::ReadingRequest;
use tarot_stream::reading::{
    Channel, DeltaKind, ReadingEvent, ReadingHandle, ReadingSnapshot, ReadingStream,
};
use tarot_stream::storage::JsonFileStore;

/// Environment variable holding the log filter directive.
const LOG_ENV: &str = "TAROT_LOG";

/// Logs go to stderr so stdout carries only the reading.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let command = match parse_args(std::env::args()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let request = match command {
        CliCommand::Version => {
            println!("{}", version_line());
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        CliCommand::Read(request) => request,
    };

    init_logging();
    let config = ReadingConfig::from_env().wrap_err("Invalid TAROT_* configuration")?;

    let runtime = tokio::runtime::Runtime::new()?;
    match runtime.block_on(run_reading(config, request))? {
        Ok(_) => Ok(()),
        Err(e) => {
            eprintln!("\n{}", e.user_message());
            tracing::debug!("Reading failed: {} ({})", e, e.error_code());
            std::process::exit(1);
        }
    }
}

async fn run_reading(
    config: ReadingConfig,
    request: ReadingRequest,
) -> Result<ReadingResult<ReadingSnapshot>> {
    let client = ReqwestHttpClient::with_connect_timeout(config.connect_timeout)
        .wrap_err("Failed to create HTTP client")?;

    let mut reading = ReadingStream::new(Arc::new(client), config.clone());
    if let Some(path) = &config.store_path {
        reading = reading.with_store(Arc::new(JsonFileStore::new(path)));
    }

    let mut status = reading.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = status.recv().await {
            if let ReadingEvent::Retrying { attempt, delay, reason } = event {
                eprintln!(
                    "\n(connection interrupted: {}; retry {} in {:?})",
                    reason, attempt, delay
                );
            }
        }
    });

    let ReadingHandle {
        opening,
        interpretation,
        one_liner,
        outcome,
    } = reading.start_reading(request);

    let tagged = [opening, interpretation, one_liner].into_iter().map(|stream| {
        let channel = stream.channel();
        stream.map(move |delta| (channel, delta))
    });
    let mut deltas = futures::stream::select_all(tagged);

    let mut current: Option<Channel> = None;
    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            next = deltas.next() => {
                let Some((channel, delta)) = next else { break };
                print_delta(&mut stdout, &mut current, channel, &delta)?;
            }
            _ = tokio::signal::ctrl_c() => {
                reading.cancel_reading();
            }
        }
    }
    writeln!(stdout)?;

    Ok(outcome.wait().await)
}

/// Write one delta, starting a new labelled line whenever the channel changes.
fn print_delta(
    out: &mut impl Write,
    current: &mut Option<Channel>,
    channel: Channel,
    delta: &DeltaKind,
) -> std::io::Result<()> {
    let fresh_line = matches!(delta, DeltaKind::Reset | DeltaKind::Replace(_));
    if *current != Some(channel) || fresh_line {
        if current.is_some() {
            writeln!(out)?;
        }
        write!(out, "[{}] ", channel)?;
        *current = Some(channel);
    }
    match delta {
        DeltaKind::Reset => {}
        DeltaKind::Append(text) | DeltaKind::Replace(text) => write!(out, "{}", text)?,
    }
    out.flush()
}
