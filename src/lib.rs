pub mod config;
pub mod console;
pub mod creature;
pub mod scheduler;
pub mod session;
pub mod species;
pub mod store;

pub use config::SessionConfig;
pub use creature::{Creature, CreatureSpec, CreatureStatus, DeathCause};
pub use scheduler::{LifecycleEvent, LifecycleScheduler, SchedulerHandle, SchedulerState};
pub use session::{CareOutcome, LoadOutcome, Session};
pub use store::{Lookup, PersistenceStore};
