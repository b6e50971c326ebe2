use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::creature::{Creature, STAT_MAX};

/// On-disk shape of one creature. Field names match the stores written by
/// earlier versions, which had no `overfed_days`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureRecord {
    pub name: String,
    pub age: u32,
    pub species: String,
    pub description: String,
    pub energy: u32,
    pub hunger: u32,
    pub mood: u32,
    pub abilities: Vec<String>,
    pub alive: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub fat_obesity: bool,
    #[serde(default)]
    pub overfed_days: u32,
}

impl From<&Creature> for CreatureRecord {
    fn from(creature: &Creature) -> Self {
        Self {
            name: creature.name.clone(),
            age: creature.age,
            species: creature.species.clone(),
            description: creature.description.clone(),
            energy: creature.energy,
            hunger: creature.hunger,
            mood: creature.mood,
            abilities: creature.abilities.clone(),
            alive: creature.is_alive(),
            created_at: creature.created_at,
            fat_obesity: creature.fat_obesity,
            overfed_days: creature.overfed_days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("{field} of '{name}' must be within 0..=100, got {value}")]
    OutOfRange {
        name: String,
        field: &'static str,
        value: u32,
    },
}

impl CreatureRecord {
    /// Energy and mood must be in range. Hunger above the maximum is
    /// accepted and capped on conversion.
    pub fn validate(&self) -> Result<(), RecordError> {
        for (field, value) in [("energy", self.energy), ("mood", self.mood)] {
            if value > STAT_MAX {
                return Err(RecordError::OutOfRange {
                    name: self.name.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl TryFrom<CreatureRecord> for Creature {
    type Error = RecordError;

    fn try_from(record: CreatureRecord) -> Result<Self, Self::Error> {
        record.validate()?;
        Ok(Self {
            name: record.name,
            age: record.age,
            species: record.species,
            description: record.description,
            energy: record.energy,
            hunger: record.hunger.min(STAT_MAX),
            mood: record.mood,
            abilities: record.abilities,
            created_at: record.created_at,
            alive: record.alive && record.energy > 0,
            overfed_days: record.overfed_days,
            fat_obesity: record.fat_obesity,
        })
    }
}

/// RFC 3339 on write. Reads also accept naive ISO-8601 timestamps, which are
/// taken as local time.
mod timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse(text: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
            return Ok(parsed.with_timezone(&Utc));
        }
        let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|err| format!("invalid created_at timestamp {text:?}: {err}"))?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| format!("created_at {text:?} does not exist in local time"))
    }
}
