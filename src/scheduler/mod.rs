//! Scheduler - ticks the active creature in the background until it dies or
//! is cancelled

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::creature::{Creature, CreatureStatus, DeathCause};
use crate::store::{PersistenceStore, StoreError};

/// The creature shared between the scheduler and the foreground. Every
/// mutation and every status read goes through this lock.
pub type SharedCreature = Arc<Mutex<Creature>>;

pub fn share(creature: Creature) -> SharedCreature {
    Arc::new(Mutex::new(creature))
}

/// Locks the creature, recovering the last written state if a previous
/// holder panicked.
pub fn lock_creature(creature: &SharedCreature) -> MutexGuard<'_, Creature> {
    creature.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Where the scheduler records a creature when it dies.
pub trait Persist: Send + Sync {
    fn persist(&self, creature: &Creature) -> Result<(), StoreError>;
}

impl Persist for PersistenceStore {
    fn persist(&self, creature: &Creature) -> Result<(), StoreError> {
        self.save(creature)
    }
}

/// Notifications published to whoever subscribed to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Status(CreatureStatus),
    Died {
        name: String,
        cause: Option<DeathCause>,
        status: CreatureStatus,
    },
    Fault {
        name: String,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Died,
    Cancelled,
    Faulted,
}

pub struct LifecycleScheduler {
    interval: Duration,
    store: Arc<dyn Persist>,
    events: broadcast::Sender<LifecycleEvent>,
}

impl LifecycleScheduler {
    pub fn new(
        interval: Duration,
        store: Arc<dyn Persist>,
        events: broadcast::Sender<LifecycleEvent>,
    ) -> Self {
        Self {
            interval,
            store,
            events,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawns the tick loop for `creature`. Must be called inside a tokio
    /// runtime. Dropping the returned handle cancels the loop.
    pub fn start(&self, creature: SharedCreature) -> SchedulerHandle {
        let name = lock_creature(&creature).name().to_string();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(SchedulerState::Running);

        let worker = Worker {
            name: name.clone(),
            interval: self.interval,
            store: Arc::clone(&self.store),
            events: self.events.clone(),
            creature,
            cancel: cancel_rx,
        };
        let events = self.events.clone();
        let supervised_name = name.clone();

        let task = tokio::spawn(async move {
            let state = match tokio::spawn(worker.run()).await {
                Ok(Ok(state)) => state,
                Ok(Err(err)) => report_fault(&events, &supervised_name, err.to_string()),
                Err(err) => report_fault(&events, &supervised_name, err.to_string()),
            };
            state_tx.send_replace(state);
            state
        });

        SchedulerHandle {
            name,
            cancel: cancel_tx,
            state: state_rx,
            task,
        }
    }
}

fn report_fault(
    events: &broadcast::Sender<LifecycleEvent>,
    name: &str,
    message: String,
) -> SchedulerState {
    log::error!("lifecycle of '{name}' stopped after a fault: {message}");
    let _ = events.send(LifecycleEvent::Fault {
        name: name.to_string(),
        message,
    });
    SchedulerState::Faulted
}

struct Worker {
    name: String,
    interval: Duration,
    store: Arc<dyn Persist>,
    events: broadcast::Sender<LifecycleEvent>,
    creature: SharedCreature,
    cancel: watch::Receiver<bool>,
}

impl Worker {
    async fn run(mut self) -> Result<SchedulerState, StoreError> {
        log::info!(
            "lifecycle started for '{}' (interval {:?})",
            self.name,
            self.interval
        );
        loop {
            tokio::select! {
                biased;
                // A dropped handle also ends the loop.
                _ = self.cancel.changed() => {
                    log::info!("lifecycle of '{}' cancelled", self.name);
                    return Ok(SchedulerState::Cancelled);
                }
                _ = tokio::time::sleep(self.interval) => {}
            }

            let (report, status) = {
                let mut creature = lock_creature(&self.creature);
                let now = Utc::now();
                let report = creature.tick_at(now);
                (report, creature.status_at(now))
            };
            log::trace!(
                "tick '{}': energy {} overfed_days {}",
                self.name,
                report.energy,
                report.overfed_days
            );
            let _ = self.events.send(LifecycleEvent::Status(status.clone()));

            if !(status.alive && status.remaining_lifespan_days > 0) {
                let snapshot = lock_creature(&self.creature).clone();
                self.store.persist(&snapshot)?;
                match report.died {
                    Some(cause) => log::info!("'{}' died: {cause}", self.name),
                    None => log::info!("'{}' is no longer alive", self.name),
                }
                let _ = self.events.send(LifecycleEvent::Died {
                    name: self.name.clone(),
                    cause: report.died,
                    status,
                });
                return Ok(SchedulerState::Died);
            }
        }
    }
}

pub struct SchedulerHandle {
    name: String,
    cancel: watch::Sender<bool>,
    state: watch::Receiver<SchedulerState>,
    task: JoinHandle<SchedulerState>,
}

impl SchedulerHandle {
    pub fn creature_name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Cancels the loop and waits until it has exited.
    pub async fn stop(self) -> SchedulerState {
        self.cancel();
        self.join().await
    }

    /// Waits for the loop to exit on its own.
    pub async fn join(self) -> SchedulerState {
        let SchedulerHandle {
            name, cancel, task, ..
        } = self;
        let state = match task.await {
            Ok(state) => state,
            Err(err) => {
                log::error!("supervisor for '{name}' failed: {err}");
                SchedulerState::Faulted
            }
        };
        drop(cancel);
        state
    }
}
