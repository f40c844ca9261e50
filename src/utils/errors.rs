//! Error handling for the PlayOn core
//!
//! This module defines the main error type used throughout the crate and the
//! error taxonomy the route layer maps onto HTTP responses.

use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

use crate::models::event::EventStatus;

/// Main error type for PlayOn core operations
#[derive(Error, Debug)]
pub enum PlayOnError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: Uuid },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: EventStatus, to: EventStatus },

    #[error("Event {event_id} is not joinable in status {status}")]
    EventNotJoinable { event_id: Uuid, status: EventStatus },

    #[error("User {user_id} is already registered for event {event_id}")]
    AlreadyRegistered { event_id: Uuid, user_id: Uuid },

    #[error("Event {event_id} has reached maximum participants")]
    EventFull { event_id: Uuid },

    #[error("User {user_id} has no active registration for event {event_id}")]
    NotRegistered { event_id: Uuid, user_id: Uuid },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt stored record: {0}")]
    Corrupt(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for PlayOn core operations
pub type Result<T> = std::result::Result<T, PlayOnError>;

/// Error taxonomy exposed to the route layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidTransition,
    EventNotJoinable,
    AlreadyRegistered,
    EventFull,
    Storage,
}

impl PlayOnError {
    /// Classify the error for the presentation layer
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlayOnError::Validation(_) => ErrorKind::Validation,
            PlayOnError::EventNotFound { .. } => ErrorKind::NotFound,
            PlayOnError::NotRegistered { .. } => ErrorKind::NotFound,
            PlayOnError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            PlayOnError::EventNotJoinable { .. } => ErrorKind::EventNotJoinable,
            PlayOnError::AlreadyRegistered { .. } => ErrorKind::AlreadyRegistered,
            PlayOnError::EventFull { .. } => ErrorKind::EventFull,
            PlayOnError::Database(_)
            | PlayOnError::Migration(_)
            | PlayOnError::Corrupt(_)
            | PlayOnError::Config(_)
            | PlayOnError::Serialization(_)
            | PlayOnError::Io(_) => ErrorKind::Storage,
        }
    }

    /// Whether a caller-side retry could ever succeed.
    ///
    /// Only storage faults are transient; the core never retries anything
    /// itself, and a blind retry of EventFull or AlreadyRegistered is never
    /// correct.
    pub fn is_transient(&self) -> bool {
        matches!(self.kind(), ErrorKind::Storage)
    }

    /// Field-level detail for validation failures, if any
    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            PlayOnError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Field-level validation error map
///
/// Collected before any storage interaction and returned whole, so the
/// presentation layer can render every offending field at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem against a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Messages recorded for one field
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    /// Convert into a `Result`, erroring when any field failed
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(PlayOnError::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}
