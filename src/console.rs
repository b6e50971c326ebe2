//! Line commands for the terminal front end.

use std::str::FromStr;

use thiserror::Error;

use crate::session::{CareOutcome, LoadOutcome, Session, SessionError};
use crate::species::SpeciesCatalog;

pub const HELP: &str = "\
Commands:
  species                  list available species
  create <species> <name>  create a new creature and make it active
  load <name>              load a saved creature and make it active
  list                     list saved creatures
  feed                     feed the active creature
  pet                      pet the active creature
  status                   show the active creature
  save                     save the active creature
  help                     show this help
  quit                     leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Species,
    Create { species: String, name: String },
    Load(String),
    List,
    Feed,
    Pet,
    Status,
    Save,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty input")]
    Empty,
    #[error("unknown command '{0}', type 'help' for a list")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(CommandError::Empty)?.to_ascii_lowercase();
        let rest: Vec<&str> = words.collect();

        let command = match verb.as_str() {
            "species" => Command::Species,
            "create" | "new" => match rest.split_first() {
                Some((species, name)) if !name.is_empty() => Command::Create {
                    species: species.to_string(),
                    name: name.join(" "),
                },
                _ => return Err(CommandError::Usage("create <species> <name>")),
            },
            "load" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage("load <name>"));
                }
                Command::Load(rest.join(" "))
            }
            "list" => Command::List,
            "feed" => Command::Feed,
            "pet" => Command::Pet,
            "status" => Command::Status,
            "save" => Command::Save,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

const NO_CREATURE: &str = "No creature selected.";
const NO_SAVES: &str = "No saved creatures found.";

/// Runs one command against the session and returns the text to show.
pub async fn execute(
    session: &mut Session,
    catalog: &SpeciesCatalog,
    command: Command,
) -> Result<String, SessionError> {
    let reply = match command {
        Command::Species => catalog
            .presets()
            .iter()
            .map(|preset| format!("{} ({}): {}", preset.key, preset.species, preset.description))
            .collect::<Vec<_>>()
            .join("\n"),
        Command::Create { species, name } => match catalog.get(&species) {
            Some(preset) => {
                let status = session.create(preset.spec_for(&name)).await?;
                format!("Created {}.\n{status}", status.name)
            }
            None => format!(
                "Unknown species '{species}'. Available: {}",
                species_keys(catalog)
            ),
        },
        Command::Load(name) => match session.load(&name).await? {
            LoadOutcome::Loaded(status) => format!("Loaded {}.\n{status}", status.name),
            LoadOutcome::NotFound => format!(
                "No creature named '{name}'. Saved: {}",
                session.saved_names()?.join(", ")
            ),
            LoadOutcome::StoreEmpty => NO_SAVES.to_string(),
        },
        Command::List => {
            let names = session.saved_names()?;
            if names.is_empty() {
                NO_SAVES.to_string()
            } else {
                format!("Saved creatures:\n{}", names.join("\n"))
            }
        }
        Command::Feed => care_reply(session, session.feed()),
        Command::Pet => care_reply(session, session.pet()),
        Command::Status => session
            .status_text()
            .unwrap_or_else(|| NO_CREATURE.to_string()),
        Command::Save => match session.save() {
            Ok(name) => format!("Saved {name}."),
            Err(SessionError::NoCreature) => NO_CREATURE.to_string(),
            Err(err) => return Err(err),
        },
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
    };
    Ok(reply)
}

fn care_reply(session: &Session, outcome: CareOutcome) -> String {
    match (outcome, session.status()) {
        (CareOutcome::Applied, Some(status)) => status.to_string(),
        (CareOutcome::Ignored, Some(status)) => format!("{} is no longer alive.", status.name),
        _ => NO_CREATURE.to_string(),
    }
}

fn species_keys(catalog: &SpeciesCatalog) -> String {
    catalog
        .presets()
        .iter()
        .map(|preset| preset.key.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
