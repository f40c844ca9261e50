//! PlayOn event core
//!
//! The event lifecycle and registration core of the PlayOn event-hosting
//! platform: event creation and status transitions, atomic event+details
//! writes, and capacity-constrained participant admission. Presentation,
//! authentication, and HTTP routing live outside this crate and consume it
//! through the service types re-exported here.

pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{ErrorKind, PlayOnError, Result, ValidationErrors};

// Re-export main components for easy access
pub use database::{EventStore, MemoryEventStore, PgEventStore};
pub use services::{EventLifecycleManager, RegistrationEngine, ServiceFactory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
