//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod event;
pub mod participant;

// Re-export commonly used models
pub use event::{
    CreateEventRequest, Event, EventDetails, EventDetailsInput, EventFilters, EventPage,
    EventStats, EventStatus, EventType, EventView, UpdateEventRequest,
};
pub use participant::{Participant, ParticipantStatus};
