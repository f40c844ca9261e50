//! Services module
//!
//! This module contains the two business logic services forming the core:
//! the event lifecycle manager and the registration engine.

pub mod lifecycle;
pub mod registration;

// Re-export commonly used services
pub use lifecycle::EventLifecycleManager;
pub use registration::RegistrationEngine;

use std::sync::Arc;

use crate::config::Settings;
use crate::database::store::EventStore;

/// Service factory wiring both services onto one storage handle.
///
/// The storage handle is constructed by the process entry point and passed
/// in; the services never reach for global state.
#[derive(Clone)]
pub struct ServiceFactory {
    pub lifecycle: EventLifecycleManager,
    pub registration: RegistrationEngine,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with both services initialized
    pub fn new(store: Arc<dyn EventStore>, settings: &Settings) -> Self {
        let lifecycle = EventLifecycleManager::new(store.clone(), settings.pagination.clone());
        let registration = RegistrationEngine::new(store);

        Self {
            lifecycle,
            registration,
        }
    }
}
