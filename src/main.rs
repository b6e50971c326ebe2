use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};

use critter::{
    console::{self, Command, HELP},
    species::SpeciesCatalog,
    LifecycleEvent, Session, SessionConfig,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Look after a virtual pet from the terminal")]
struct Cli {
    /// Path to a YAML session config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the creature store file
    #[arg(long)]
    store: Option<PathBuf>,

    /// Override the tick interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// YAML file with species presets (built-in presets when omitted)
    #[arg(long)]
    species_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => SessionConfig::from_yaml(path)?,
        None => SessionConfig::default(),
    };
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    if let Some(interval_ms) = cli.interval_ms {
        config.tick_interval_ms = interval_ms;
    }
    if cli.species_file.is_some() {
        config.species_file = cli.species_file;
    }
    config.logging.init();

    let catalog = match &config.species_file {
        Some(path) => SpeciesCatalog::load(path)?,
        None => SpeciesCatalog::builtin(),
    };
    let mut session = Session::new(&config);
    let mut events = BroadcastStream::new(session.subscribe());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(Command::Quit) => break,
                    Ok(command) => match console::execute(&mut session, &catalog, command).await {
                        Ok(reply) => println!("{reply}"),
                        Err(err) => eprintln!("error: {err}"),
                    },
                    Err(err) => eprintln!("{err}"),
                }
            }
            Some(event) = events.next() => match event {
                Ok(LifecycleEvent::Died { name, cause, status }) => {
                    match cause {
                        Some(cause) => println!("{name} {cause}."),
                        None => println!("{name} has died."),
                    }
                    println!("{status}");
                }
                Ok(LifecycleEvent::Fault { name, message }) => {
                    eprintln!("lifecycle of {name} stopped: {message}");
                }
                Ok(LifecycleEvent::Status(status)) => {
                    log::debug!("{} energy {}/100", status.name, status.energy);
                }
                Err(err) => log::warn!("missed lifecycle events: {err}"),
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.shutdown().await;
    Ok(())
}
