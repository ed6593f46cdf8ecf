//! `mailpeek`: print the newest messages of an IMAP mailbox as JSON.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailpeek_core::{Credentials, FetchOptions, MailSession, Settings};

#[derive(Parser)]
#[command(name = "mailpeek", version, about = "Fetch the newest messages of a mailbox")]
struct Cli {
    /// Account address, e.g. me@example.com.
    address: String,

    /// Account password.
    #[arg(long, env = "MAILPEEK_PASSWORD", hide_env_values = true)]
    password: String,

    /// Mailbox to read.
    #[arg(long, default_value = "INBOX")]
    mailbox: String,

    /// IMAP search keys, passed through verbatim.
    #[arg(long, default_value = "ALL")]
    criteria: String,

    /// Maximum number of messages [default: from settings].
    #[arg(long)]
    limit: Option<usize>,

    /// Mark fetched messages as seen.
    #[arg(long)]
    mark_seen: bool,

    /// Settings file [default: <config dir>/mailpeek/settings.json].
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailpeek=info,mailpeek_core=info,mailpeek_imap=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("loading settings")?;

    let credentials = Credentials::new(&cli.address, cli.password)?;
    let options = FetchOptions::new()
        .mailbox(cli.mailbox)
        .criteria(cli.criteria)
        .limit(cli.limit.unwrap_or(settings.default_limit))
        .mark_seen(cli.mark_seen);

    let mut session = MailSession::from_settings(credentials, &settings);
    session.connect().await?;
    info!(host = session.connected_host().unwrap_or_default(), "connected");

    let result = session.fetch_messages(&options).await;
    session.disconnect().await;
    let batch = result.context("fetching messages")?;

    println!("{}", serde_json::to_string_pretty(&batch)?);
    Ok(())
}
