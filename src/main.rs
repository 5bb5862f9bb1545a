// src/main.rs
use std::{net::SocketAddr, process::ExitCode, sync::Arc};

use clap::Parser;
use tokio::net::TcpListener;
use tracing::error;
use tracing_subscriber::EnvFilter;
use wake_on_demand::{
    api,
    config::{Cli, Verb},
    ClientError, CommandClient, Registry,
};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Verb::Server => match run_server(&cli).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("fatal: {e:#}");
                ExitCode::FAILURE
            }
        },
        Verb::List => list(&CommandClient::new(&cli.server)).await,
        ref verb => match verb.command() {
            Some((command, id)) => {
                let client = CommandClient::new(&cli.server);
                send(&client, verb.name(), command, id).await
            }
            None => ExitCode::FAILURE,
        },
    }
}

async fn run_server(cli: &Cli) -> anyhow::Result<()> {
    let registry = Arc::new(Registry::new(cli.timeout));
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let listener = TcpListener::bind(addr).await?;
    api::serve(listener, registry, api::shutdown_signal()).await
}

// ---------- CLIENT COMMANDS ---------- //

async fn send(client: &CommandClient, verb: &str, command: &str, id: &str) -> ExitCode {
    match client.set_command(id, command).await {
        Ok(_) => {
            println!("✓ Command '{verb}' queued for {id}");
            ExitCode::SUCCESS
        }
        Err(e) => report(client, e),
    }
}

async fn list(client: &CommandClient) -> ExitCode {
    let esps = match client.list().await {
        Ok(esps) => esps,
        Err(e) => return report(client, e),
    };

    if esps.is_empty() {
        println!("No ESPs registered");
        return ExitCode::SUCCESS;
    }

    println!("Registered ESPs:");
    for esp in esps {
        let color = if esp.online { GREEN } else { RED };
        println!("  {color}●{RESET} {:<20} [last seen: {}]", esp.id, esp.last_seen);
    }
    ExitCode::SUCCESS
}

fn report(client: &CommandClient, err: ClientError) -> ExitCode {
    match err {
        ClientError::Connect { .. } => {
            println!("Error: Could not connect to server at {}", client.base_url());
            println!("Is the server running? Start with: wake-on-demand server");
        }
        ClientError::Status(status) => println!("✗ Error: {status}"),
        ClientError::Http(e) => println!("✗ Error: {e}"),
        other => println!("✗ {other}"),
    }
    ExitCode::FAILURE
}
