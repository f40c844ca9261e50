//! Database module
//!
//! This module handles database connections and the storage implementations
//! behind the event core.

pub mod connection;
pub mod memory;
pub mod repositories;
pub mod store;

// Re-export commonly used database components
pub use connection::{create_pool, health_check, run_migrations, DatabasePool};
pub use memory::MemoryEventStore;
pub use repositories::{EventRepository, ParticipantRepository, PgEventStore};
pub use store::{AdmitOutcome, EventChanges, EventStore, StatusWrite};
