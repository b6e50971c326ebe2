//! Creature state model and the survival rules applied to it.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_LIFESPAN_DAYS: i64 = 365;
pub const STAT_MAX: u32 = 100;
pub const FEED_AMOUNT: u32 = 20;
pub const PET_AMOUNT: u32 = 10;
/// Hunger strictly above this marks the creature as obese, permanently.
pub const OBESITY_THRESHOLD: u32 = 80;
/// Hunger at or above this during a tick counts as one overfed day.
pub const OVERFED_THRESHOLD: u32 = 100;
pub const OVERFED_DAYS_FATAL: u32 = 30;

const SECONDS_PER_DAY: i64 = 86_400;

pub fn max_lifespan() -> Duration {
    Duration::days(MAX_LIFESPAN_DAYS)
}

fn default_age() -> u32 {
    1
}

/// Initial values for a new creature, usually produced by a species preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureSpec {
    pub name: String,
    pub species: String,
    pub description: String,
    #[serde(default)]
    pub abilities: Vec<String>,
    pub energy: u32,
    pub hunger: u32,
    pub mood: u32,
    #[serde(default = "default_age")]
    pub age: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreatureError {
    #[error("creature name must not be empty")]
    EmptyName,
    #[error("{field} must be within 0..=100, got {value}")]
    OutOfRange { field: &'static str, value: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Exhaustion,
    Overfeeding,
    OldAge,
}

impl fmt::Display for DeathCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DeathCause::Exhaustion => "ran out of energy",
            DeathCause::Overfeeding => "was overfed for too long",
            DeathCause::OldAge => "reached the end of its lifespan",
        };
        f.write_str(text)
    }
}

/// What a single tick did to the creature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub energy: u32,
    pub overfed_days: u32,
    /// Set only on the tick that ended the creature's life.
    pub died: Option<DeathCause>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creature {
    pub(crate) name: String,
    pub(crate) age: u32,
    pub(crate) species: String,
    pub(crate) description: String,
    pub(crate) energy: u32,
    pub(crate) hunger: u32,
    pub(crate) mood: u32,
    pub(crate) abilities: Vec<String>,
    pub(crate) created_at: DateTime<Utc>,
    /// Terminal flag. Only ever cleared; the effective state is `is_alive_at`.
    pub(crate) alive: bool,
    pub(crate) overfed_days: u32,
    pub(crate) fat_obesity: bool,
}

impl Creature {
    pub fn create(spec: CreatureSpec) -> Result<Self, CreatureError> {
        Self::create_at(spec, Utc::now())
    }

    pub fn create_at(
        spec: CreatureSpec,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CreatureError> {
        if spec.name.trim().is_empty() {
            return Err(CreatureError::EmptyName);
        }
        for (field, value) in [
            ("energy", spec.energy),
            ("hunger", spec.hunger),
            ("mood", spec.mood),
        ] {
            if value > STAT_MAX {
                return Err(CreatureError::OutOfRange { field, value });
            }
        }

        // Alive is derived once here; afterwards only `tick` clears it.
        let alive = spec.energy > 0 && Utc::now() - created_at < max_lifespan();
        Ok(Self {
            name: spec.name,
            age: spec.age,
            species: spec.species,
            description: spec.description,
            energy: spec.energy,
            hunger: spec.hunger,
            mood: spec.mood,
            abilities: spec.abilities,
            created_at,
            alive,
            overfed_days: 0,
            fat_obesity: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn species(&self) -> &str {
        &self.species
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn energy(&self) -> u32 {
        self.energy
    }

    pub fn hunger(&self) -> u32 {
        self.hunger
    }

    pub fn mood(&self) -> u32 {
        self.mood
    }

    pub fn abilities(&self) -> &[String] {
        &self.abilities
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn overfed_days(&self) -> u32 {
        self.overfed_days
    }

    pub fn is_obese(&self) -> bool {
        self.fat_obesity
    }

    pub fn is_alive(&self) -> bool {
        self.is_alive_at(Utc::now())
    }

    /// Alive means the terminal flag is still set, energy is left, and the
    /// creature is younger than its maximum lifespan at `now`.
    pub fn is_alive_at(&self, now: DateTime<Utc>) -> bool {
        self.alive && self.energy > 0 && now - self.created_at < max_lifespan()
    }

    pub fn remaining_lifespan_days(&self) -> i64 {
        self.remaining_lifespan_days_at(Utc::now())
    }

    /// Whole days left, floored. Negative once the lifespan is overdue.
    pub fn remaining_lifespan_days_at(&self, now: DateTime<Utc>) -> i64 {
        let remaining = max_lifespan() - (now - self.created_at);
        remaining.num_seconds().div_euclid(SECONDS_PER_DAY)
    }

    /// Raises hunger by [`FEED_AMOUNT`]. A dead creature ignores the call and
    /// `false` is returned.
    pub fn feed(&mut self) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.hunger = self.hunger.saturating_add(FEED_AMOUNT).min(STAT_MAX);
        if self.hunger > OBESITY_THRESHOLD {
            self.fat_obesity = true;
        }
        true
    }

    /// Raises mood by [`PET_AMOUNT`]. A dead creature ignores the call and
    /// `false` is returned.
    pub fn pet(&mut self) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.mood = self.mood.saturating_add(PET_AMOUNT).min(STAT_MAX);
        true
    }

    pub fn tick(&mut self) -> TickReport {
        self.tick_at(Utc::now())
    }

    /// One decay step. Energy and overfeeding are checked independently and
    /// either can end the creature's life. Ticking a dead creature changes
    /// nothing and reports no death.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> TickReport {
        if !self.alive || self.energy == 0 {
            self.alive = false;
            return self.report(None);
        }

        self.energy = self.energy.saturating_sub(1);
        if self.energy == 0 {
            self.alive = false;
        }

        if self.hunger >= OVERFED_THRESHOLD {
            self.overfed_days = self.overfed_days.saturating_add(1);
        }
        if self.overfed_days >= OVERFED_DAYS_FATAL {
            self.alive = false;
        }

        if now - self.created_at >= max_lifespan() {
            self.alive = false;
        }

        let died = (!self.alive).then(|| {
            if self.energy == 0 {
                DeathCause::Exhaustion
            } else if self.overfed_days >= OVERFED_DAYS_FATAL {
                DeathCause::Overfeeding
            } else {
                DeathCause::OldAge
            }
        });
        self.report(died)
    }

    fn report(&self, died: Option<DeathCause>) -> TickReport {
        TickReport {
            energy: self.energy,
            overfed_days: self.overfed_days,
            died,
        }
    }

    pub fn status(&self) -> CreatureStatus {
        self.status_at(Utc::now())
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> CreatureStatus {
        CreatureStatus {
            name: self.name.clone(),
            age: self.age,
            species: self.species.clone(),
            description: self.description.clone(),
            energy: self.energy,
            hunger: self.hunger,
            mood: self.mood,
            abilities: self.abilities.clone(),
            fat_obesity: self.fat_obesity,
            overfed_days: self.overfed_days,
            alive: self.is_alive_at(now),
            remaining_lifespan_days: self.remaining_lifespan_days_at(now),
        }
    }

    pub fn status_text(&self) -> String {
        self.status().to_string()
    }
}

/// A consistent copy of every field, taken at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatureStatus {
    pub name: String,
    pub age: u32,
    pub species: String,
    pub description: String,
    pub energy: u32,
    pub hunger: u32,
    pub mood: u32,
    pub abilities: Vec<String>,
    pub fat_obesity: bool,
    pub overfed_days: u32,
    pub alive: bool,
    pub remaining_lifespan_days: i64,
}

impl fmt::Display for CreatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Age: {} days", self.age)?;
        writeln!(f, "Species: {}", self.species)?;
        writeln!(f, "Description: {}", self.description)?;
        writeln!(f, "Energy: {}/{STAT_MAX}", self.energy)?;
        writeln!(f, "Hunger: {}/{STAT_MAX}", self.hunger)?;
        writeln!(f, "Mood: {}/{STAT_MAX}", self.mood)?;
        writeln!(f, "Abilities: {}", self.abilities.join(", "))?;
        writeln!(f, "Obese: {}", if self.fat_obesity { "yes" } else { "no" })?;
        writeln!(f, "Remaining lifespan: {} days", self.remaining_lifespan_days)?;
        if !self.alive {
            writeln!(f, "Status: deceased")?;
        }
        Ok(())
    }
}
