use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::creature::{CreatureSpec, STAT_MAX};

fn default_energy() -> u32 {
    STAT_MAX
}

fn default_mood() -> u32 {
    STAT_MAX
}

fn default_age() -> u32 {
    1
}

/// Starting values shared by every creature of one species.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpeciesPreset {
    pub key: String,
    pub species: String,
    pub description: String,
    #[serde(default)]
    pub abilities: Vec<String>,
    #[serde(default = "default_energy")]
    pub energy: u32,
    #[serde(default)]
    pub hunger: u32,
    #[serde(default = "default_mood")]
    pub mood: u32,
    #[serde(default = "default_age")]
    pub age: u32,
}

impl SpeciesPreset {
    fn builtin(key: &str, species: &str, description: &str, abilities: &[&str]) -> Self {
        Self {
            key: key.into(),
            species: species.into(),
            description: description.into(),
            abilities: abilities.iter().map(|a| a.to_string()).collect(),
            energy: default_energy(),
            hunger: 0,
            mood: default_mood(),
            age: default_age(),
        }
    }

    pub fn spec_for(&self, name: &str) -> CreatureSpec {
        CreatureSpec {
            name: name.to_string(),
            species: self.species.clone(),
            description: self.description.clone(),
            abilities: self.abilities.clone(),
            energy: self.energy,
            hunger: self.hunger,
            mood: self.mood,
            age: self.age,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    species: Vec<SpeciesPreset>,
}

#[derive(Debug, Clone)]
pub struct SpeciesCatalog {
    presets: Vec<SpeciesPreset>,
}

impl Default for SpeciesCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SpeciesCatalog {
    pub fn builtin() -> Self {
        Self {
            presets: vec![
                SpeciesPreset::builtin(
                    "rabbit",
                    "Rabbit",
                    "A friendly, energetic rabbit that loves to hop around and eat fresh carrots.",
                    &["Jumping", "Digging", "Finding carrots"],
                ),
                SpeciesPreset::builtin(
                    "cat",
                    "Cat",
                    "An elegant and mysterious cat that loves lazing in the sun and playing with toy mice.",
                    &["Climbing", "Sneaking", "Catching mice"],
                ),
            ],
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read species file {}", path.display()))?;
        let file: CatalogFile = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        if file.species.is_empty() {
            bail!("species file {} defines no species", path.display());
        }
        for preset in &file.species {
            if [preset.energy, preset.hunger, preset.mood]
                .iter()
                .any(|value| *value > STAT_MAX)
            {
                bail!("species '{}' has a stat above {STAT_MAX}", preset.key);
            }
        }
        Ok(Self {
            presets: file.species,
        })
    }

    pub fn presets(&self) -> &[SpeciesPreset] {
        &self.presets
    }

    /// Case-insensitive lookup by key or display name.
    pub fn get(&self, key: &str) -> Option<&SpeciesPreset> {
        self.presets.iter().find(|preset| {
            preset.key.eq_ignore_ascii_case(key) || preset.species.eq_ignore_ascii_case(key)
        })
    }
}
