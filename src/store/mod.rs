//! JSON-file persistence for the creature collection, keyed by name.

mod record;

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::creature::Creature;

pub use record::{CreatureRecord, RecordError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("creature store io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("creature store {} is malformed: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("creature store {} holds an invalid record: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: RecordError,
    },
    #[error("failed to encode creature store: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result of a lookup by name. An empty or missing store is reported apart
/// from a store that simply lacks the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Creature),
    NotFound,
    Empty,
}

pub struct PersistenceStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl PersistenceStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Upserts `creature`: any stored entry with the same name is replaced
    /// and the new entry goes last.
    pub fn save(&self, creature: &Creature) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records = self.read_records()?;
        let before = records.len();
        records.retain(|record| record.name != creature.name());
        let replaced = records.len() != before;
        records.push(CreatureRecord::from(creature));
        self.write_records(&records)?;
        log::debug!(
            "saved '{}' to {} ({} entries, replaced: {replaced})",
            creature.name(),
            self.path.display(),
            records.len()
        );
        Ok(())
    }

    pub fn load_all(&self) -> Result<Vec<Creature>, StoreError> {
        self.read_records()?
            .into_iter()
            .map(|record| self.to_creature(record))
            .collect()
    }

    pub fn names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .read_records()?
            .into_iter()
            .map(|record| record.name)
            .collect())
    }

    pub fn find_by_name(&self, name: &str) -> Result<Lookup, StoreError> {
        let records = self.read_records()?;
        if records.is_empty() {
            return Ok(Lookup::Empty);
        }
        match records.into_iter().find(|record| record.name == name) {
            Some(record) => Ok(Lookup::Found(self.to_creature(record)?)),
            None => Ok(Lookup::NotFound),
        }
    }

    /// Every record is range-checked, so one bad entry fails the whole read
    /// and a save never rewrites a store it could not load.
    fn read_records(&self) -> Result<Vec<CreatureRecord>, StoreError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(self.io_error(source)),
        };
        let records: Vec<CreatureRecord> =
            serde_json::from_str(&data).map_err(|source| StoreError::Parse {
                path: self.path.clone(),
                source,
            })?;
        for record in &records {
            record.validate().map_err(|source| self.invalid(source))?;
        }
        Ok(records)
    }

    fn to_creature(&self, record: CreatureRecord) -> Result<Creature, StoreError> {
        Creature::try_from(record).map_err(|source| self.invalid(source))
    }

    fn invalid(&self, source: RecordError) -> StoreError {
        StoreError::Invalid {
            path: self.path.clone(),
            source,
        }
    }

    /// Writes a sibling temp file and renames it over the store, so a failed
    /// write leaves the previous contents in place.
    fn write_records(&self, records: &[CreatureRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
        }
        let json = serde_json::to_string_pretty(records).map_err(StoreError::Encode)?;
        let temp_path = self.temp_path();
        let written = File::create(&temp_path).and_then(|mut file| {
            file.write_all(json.as_bytes())?;
            file.sync_all()
        });
        if let Err(source) = written.and_then(|()| fs::rename(&temp_path, &self.path)) {
            fs::remove_file(&temp_path).ok();
            return Err(self.io_error(source));
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "creatures.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
