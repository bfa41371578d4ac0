//! Console front-end for the Connect 4 client.
//!
//! Usage:
//!   connect4 --nick alice                       # Connect to the default server
//!   connect4 --config client.toml --host 10.0.0.2 --port 4000 --nick alice
//!
//! Every notification from the server is printed on its own line. Commands
//! are read from stdin; type `help` for the list.

mod console;
mod logging;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use connect4_network::{ClientConfig, ClientEvent, GameClient};

use crate::console::{Command, HELP};

#[derive(Parser, Debug)]
#[command(name = "connect4", about = "Connect 4 lobby and game client")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server IPv4 address
    #[arg(long)]
    host: Option<String>,

    /// Server port
    #[arg(short, long)]
    port: Option<String>,

    /// Nickname shown to other players
    #[arg(short, long)]
    nick: Option<String>,

    /// Directory for the per-run log files
    #[arg(long, default_value = "log")]
    log_dir: PathBuf,
}

impl Cli {
    /// File values first, flags on top.
    fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::default(),
        };
        if let Some(nick) = &self.nick {
            config.nick = Some(nick.clone());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_dir)?;

    let config = cli.client_config()?;
    let host = cli.host.clone().unwrap_or_else(|| config.host.clone());
    let port = cli.port.clone().unwrap_or_else(|| config.port.to_string());
    let nick = config.nick.clone().unwrap_or_default();

    let (client, mut events) = GameClient::connect(config, &host, &port, &nick)
        .context("cannot start the client")?;
    info!(endpoint = %client.endpoint(), nick = %client.nick(), "client started");
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let outcome = loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ClientEvent::Terminated { reason }) => {
                    println!("terminated: {reason}");
                    break Err(anyhow::anyhow!("protocol violation: {reason}"));
                }
                Some(event) => println!("{event}"),
                None => break Ok(()),
            },
            line = lines.next_line() => {
                let Some(line) = line.context("cannot read stdin")? else {
                    break Ok(());
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break Ok(()),
                    Ok(Command::Help) => println!("{HELP}"),
                    Ok(Command::Roster) => {
                        for (nick, available) in client.roster() {
                            let status = if available { "available" } else { "busy" };
                            println!("  {nick} ({status})");
                        }
                    }
                    Ok(command) => {
                        if let Err(e) = console::execute(&client, command).await {
                            warn!(error = %e, "command rejected");
                            println!("error: {e}");
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            }
        }
    };

    client.disconnect().await;
    outcome
}
