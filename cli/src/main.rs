// actorlink — diagnostic CLI for the actor message exchange
//
// Starts a client session against a remote actor endpoint, sends messages and
// prints what comes back.

mod config;

use actorlink_core::{ActorClient, Address, Message, StatusEvent};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};

#[derive(Parser)]
#[command(name = "actorlink")]
#[command(about = "actorlink — talk to a remote actor endpoint", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Endpoint URL, overriding the configured one
    #[arg(short, long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a session: print deliveries, send JSON lines read from stdin
    Run {
        /// Address to listen on (repeatable, defaults to the assigned address)
        #[arg(short, long)]
        listen: Vec<String>,
    },
    /// Send one message and exit once it has been delivered
    Send {
        #[arg(short, long)]
        destination: String,
        #[arg(short = 't', long = "type", default_value = "java.lang.String")]
        message_type: String,
        /// JSON payload; anything that is not JSON is sent as a string
        #[arg(long)]
        data: String,
        /// Give up after this many seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
    /// Discover and print the assigned address
    Address {
        /// Give up after this many seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Set { key: String, value: String },
    Get { key: String },
    List,
}

/// One line of `run` input
#[derive(Debug, Deserialize)]
struct OutgoingLine {
    source: Option<String>,
    destination: String,
    #[serde(rename = "type")]
    message_type: String,
    data: Value,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Config { action } => cmd_config(action).await,
        Commands::Run { listen } => cmd_run(build_client(cli.endpoint)?, listen).await,
        Commands::Send {
            destination,
            message_type,
            data,
            timeout,
        } => {
            let client = build_client(cli.endpoint)?;
            cmd_send(client, destination, message_type, data, timeout).await
        }
        Commands::Address { timeout } => cmd_address(build_client(cli.endpoint)?, timeout).await,
    }
}

fn build_client(endpoint: Option<String>) -> Result<ActorClient> {
    let mut config = config::Config::load()?;
    if let Some(endpoint) = endpoint {
        config.apply("endpoint", &endpoint)?;
    }
    tracing::debug!("Using endpoint {}", config.endpoint);
    Ok(ActorClient::new(
        config.client_config(),
        Arc::new(config.transport()),
    ))
}

async fn cmd_config(action: ConfigAction) -> Result<()> {
    let mut config = config::Config::load()?;

    match action {
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            println!("{} Set {} = {}", "✓".green(), key.bright_cyan(), value);
        }

        ConfigAction::Get { key } => {
            if let Some(value) = config.get(&key) {
                println!("{} = {}", key.bright_cyan(), value);
            } else {
                anyhow::bail!("Unknown config key: {}", key);
            }
        }

        ConfigAction::List => {
            println!("{}", "Configuration".bold());
            println!();

            for (key, value) in config.list() {
                println!("  {:<22} {}", key.bright_cyan(), value);
            }
            println!();
            println!("  {}", config::Config::config_file()?.display().to_string().dimmed());
        }
    }

    Ok(())
}

async fn discover(client: &ActorClient, timeout: u64) -> Result<Address> {
    client.start()?;
    tokio::time::timeout(Duration::from_secs(timeout), client.address())
        .await
        .context("Timed out waiting for an address")?
        .context("Client stopped before an address was assigned")
}

async fn cmd_address(client: ActorClient, timeout: u64) -> Result<()> {
    let address = discover(&client, timeout).await?;
    println!("{}", address);
    client.shutdown();
    Ok(())
}

async fn cmd_send(
    client: ActorClient,
    destination: String,
    message_type: String,
    data: String,
    timeout: u64,
) -> Result<()> {
    let data = serde_json::from_str(&data).unwrap_or(Value::String(data));
    let mut status = client.subscribe_status();
    let deadline = Duration::from_secs(timeout);

    let me = discover(&client, timeout).await?;
    client
        .write_message(&me, destination.as_str(), message_type, data)
        .context("Invalid destination address")?;

    // Done once a successful poll has forwarded past the message
    tokio::time::timeout(deadline, async {
        loop {
            match status.recv().await {
                Ok(StatusEvent::PollSucceeded { .. }) if client.stats().pending_outgoing == 0 => {
                    return Ok(());
                }
                Ok(StatusEvent::PollFailed(e)) => tracing::warn!("Poll failed: {}", e),
                Ok(StatusEvent::Stopped) | Err(broadcast::error::RecvError::Closed) => {
                    anyhow::bail!("Client stopped before the message was sent")
                }
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            }
        }
    })
    .await
    .context("Timed out waiting for the message to be sent")??;

    println!("{} Sent {} -> {}", "✓".green(), me, destination.bright_cyan());
    client.shutdown();
    Ok(())
}

async fn cmd_run(client: ActorClient, listen: Vec<String>) -> Result<()> {
    let (tx, mut delivered) = mpsc::unbounded_channel::<(String, Message)>();
    let mut status = client.subscribe_status();

    // Validate before starting anything
    for address in &listen {
        address
            .parse::<Address>()
            .with_context(|| format!("Invalid listen address {:?}", address))?;
    }

    if listen.is_empty() {
        // Registered from a ready callback so nothing is dispatched before it exists
        let handle = client.clone();
        let tx = tx.clone();
        client.ready(move |address| {
            let tag = address.to_string();
            let _ = handle.listen(address, move |msg: &Message| {
                let _ = tx.send((tag.clone(), msg.clone()));
            });
        });
    } else {
        for address in listen {
            let tx = tx.clone();
            let tag = address.clone();
            client.listen(address.as_str(), move |msg: &Message| {
                let _ = tx.send((tag.clone(), msg.clone()));
            })?;
        }
    }
    drop(tx);

    println!("{}", "Starting session...".bold());
    client.start()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut me: Option<Address> = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,

            event = status.recv() => match event {
                Ok(StatusEvent::DiscoverySucceeded(address)) => {
                    println!("{} Assigned address {}", "✓".green(), address.to_string().bright_cyan());
                    me = Some(address);
                }
                Ok(event @ (StatusEvent::DiscoveryFailed(_) | StatusEvent::PollFailed(_))) => {
                    println!("{} {}", "!".yellow(), event);
                }
                Ok(StatusEvent::PollSucceeded { received }) if received > 0 => {
                    tracing::debug!("Received {} message(s)", received);
                }
                Ok(StatusEvent::Stopped) | Err(broadcast::error::RecvError::Closed) => break,
                Ok(event) => tracing::trace!("{}", event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!("Skipped {} status events", n);
                }
            },

            Some((tag, msg)) = delivered.recv() => print_delivery(&tag, &msg),

            line = lines.next_line(), if stdin_open => match line.context("Failed to read stdin")? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => {
                    if let Err(e) = send_line(&client, me.as_ref(), &line) {
                        println!("{} {:#}", "✗".red(), e);
                    }
                }
                None => stdin_open = false,
            },
        }
    }

    client.shutdown();
    Ok(())
}

fn send_line(client: &ActorClient, me: Option<&Address>, line: &str) -> Result<()> {
    let outgoing: OutgoingLine = serde_json::from_str(line).context("Expected a JSON message")?;
    let source = match (outgoing.source, me) {
        (Some(source), _) => source.parse().context("Invalid source address")?,
        (None, Some(me)) => me.clone(),
        (None, None) => anyhow::bail!("No address assigned yet; give an explicit source"),
    };

    client.write_message(
        source,
        outgoing.destination.as_str(),
        outgoing.message_type,
        outgoing.data,
    )?;
    Ok(())
}

fn print_delivery(listener: &str, msg: &Message) {
    println!(
        "{} [{}] {} -> {} ({}) {}",
        "←".green(),
        listener.dimmed(),
        msg.source(),
        msg.destination().to_string().bright_cyan(),
        msg.message_type(),
        msg.data()
    );
}
