//! The session owns the one active creature and its scheduler.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::SessionConfig;
use crate::creature::{Creature, CreatureError, CreatureSpec, CreatureStatus};
use crate::scheduler::{
    lock_creature, share, LifecycleEvent, LifecycleScheduler, SchedulerHandle, SchedulerState,
    SharedCreature,
};
use crate::store::{Lookup, PersistenceStore, StoreError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Creature(#[from] CreatureError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("no creature is selected")]
    NoCreature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CareOutcome {
    Applied,
    /// The creature is dead and was left untouched.
    Ignored,
    NoCreature,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(CreatureStatus),
    NotFound,
    StoreEmpty,
}

struct Active {
    creature: SharedCreature,
    handle: Option<SchedulerHandle>,
}

pub struct Session {
    store: Arc<PersistenceStore>,
    scheduler: LifecycleScheduler,
    events: broadcast::Sender<LifecycleEvent>,
    active: Option<Active>,
}

impl Session {
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_store(
            Arc::new(PersistenceStore::new(&config.store_path)),
            config.tick_interval(),
            config.event_capacity,
        )
    }

    pub fn with_store(
        store: Arc<PersistenceStore>,
        tick_interval: Duration,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        let scheduler = LifecycleScheduler::new(tick_interval, store.clone(), events.clone());
        Self {
            store,
            scheduler,
            events,
            active: None,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &PersistenceStore {
        &self.store
    }

    /// Creates, saves and activates a new creature, replacing the current one.
    /// The old scheduler is stopped before the save so its death save cannot
    /// overwrite a new creature of the same name.
    pub async fn create(&mut self, spec: CreatureSpec) -> Result<CreatureStatus, SessionError> {
        let creature = Creature::create(spec)?;
        self.deactivate().await;
        self.store.save(&creature)?;
        log::info!("created '{}' the {}", creature.name(), creature.species());
        Ok(self.activate(creature).await)
    }

    /// Activates a stored creature by name, replacing the current one. The
    /// current creature stays active when nothing matches.
    pub async fn load(&mut self, name: &str) -> Result<LoadOutcome, SessionError> {
        match self.store.find_by_name(name)? {
            Lookup::Found(creature) => Ok(LoadOutcome::Loaded(self.activate(creature).await)),
            Lookup::NotFound => Ok(LoadOutcome::NotFound),
            Lookup::Empty => Ok(LoadOutcome::StoreEmpty),
        }
    }

    async fn activate(&mut self, creature: Creature) -> CreatureStatus {
        self.deactivate().await;
        let status = creature.status();
        let shared = share(creature);
        // A dead creature can be inspected and saved but is not ticked.
        let handle = status
            .alive
            .then(|| self.scheduler.start(Arc::clone(&shared)));
        self.active = Some(Active {
            creature: shared,
            handle,
        });
        status
    }

    /// Stops the scheduler of the active creature, waits for it to exit, and
    /// clears the selection.
    pub async fn deactivate(&mut self) -> Option<SchedulerState> {
        let active = self.active.take()?;
        match active.handle {
            Some(handle) => Some(handle.stop().await),
            None => None,
        }
    }

    pub fn feed(&self) -> CareOutcome {
        self.care(Creature::feed)
    }

    pub fn pet(&self) -> CareOutcome {
        self.care(Creature::pet)
    }

    fn care(&self, action: fn(&mut Creature) -> bool) -> CareOutcome {
        let Some(active) = &self.active else {
            return CareOutcome::NoCreature;
        };
        let status = {
            let mut creature = lock_creature(&active.creature);
            if !action(&mut *creature) {
                return CareOutcome::Ignored;
            }
            creature.status()
        };
        let _ = self.events.send(LifecycleEvent::Status(status));
        CareOutcome::Applied
    }

    pub fn status(&self) -> Option<CreatureStatus> {
        self.active
            .as_ref()
            .map(|active| lock_creature(&active.creature).status())
    }

    pub fn status_text(&self) -> Option<String> {
        self.status().map(|status| status.to_string())
    }

    /// Saves the active creature and returns its name.
    pub fn save(&self) -> Result<String, SessionError> {
        let active = self.active.as_ref().ok_or(SessionError::NoCreature)?;
        let snapshot = lock_creature(&active.creature).clone();
        self.store.save(&snapshot)?;
        Ok(snapshot.name)
    }

    pub fn load_all(&self) -> Result<Vec<Creature>, SessionError> {
        Ok(self.store.load_all()?)
    }

    pub fn saved_names(&self) -> Result<Vec<String>, SessionError> {
        Ok(self.store.names()?)
    }

    pub fn find_by_name(&self, name: &str) -> Result<Lookup, SessionError> {
        Ok(self.store.find_by_name(name)?)
    }

    pub fn active_creature(&self) -> Option<SharedCreature> {
        self.active
            .as_ref()
            .map(|active| Arc::clone(&active.creature))
    }

    /// State of the active creature's scheduler, if one was started.
    pub fn scheduler_state(&self) -> Option<SchedulerState> {
        self.active
            .as_ref()
            .and_then(|active| active.handle.as_ref())
            .map(SchedulerHandle::state)
    }

    pub async fn shutdown(mut self) {
        if let Some(state) = self.deactivate().await {
            log::debug!("session closed, scheduler ended as {state:?}");
        }
    }
}
