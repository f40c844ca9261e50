//! Repository implementations
//!
//! This module contains data access repositories and the Postgres-backed
//! implementation of the storage contract.

pub mod event;
pub mod participant;

pub use event::EventRepository;
pub use participant::ParticipantRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::store::{AdmitOutcome, EventChanges, EventStore, StatusWrite};
use crate::models::event::{
    Event, EventDetails, EventDetailsInput, EventFilters, EventStats, EventStatus, EventView,
};
use crate::models::participant::{Participant, ParticipantStatus};
use crate::utils::errors::Result;

/// Postgres-backed event store
#[derive(Clone)]
pub struct PgEventStore {
    pub events: EventRepository,
    pub participants: ParticipantRepository,
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            events: EventRepository::new(pool.clone()),
            participants: ParticipantRepository::new(pool),
        }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert_event(&self, event: Event, details: Option<EventDetails>) -> Result<()> {
        self.events.insert(&event, details.as_ref()).await
    }

    async fn fetch_event(&self, event_id: Uuid) -> Result<Option<EventView>> {
        self.events.fetch(event_id).await
    }

    async fn update_event(
        &self,
        event_id: Uuid,
        changes: EventChanges,
        details: Option<EventDetailsInput>,
    ) -> Result<Option<EventView>> {
        self.events.update(event_id, changes, details).await
    }

    async fn set_status(
        &self,
        event_id: Uuid,
        expected: EventStatus,
        next: EventStatus,
        published_at: Option<DateTime<Utc>>,
        reason: Option<String>,
    ) -> Result<StatusWrite> {
        self.events
            .set_status(event_id, expected, next, published_at, reason)
            .await
    }

    async fn list_events(
        &self,
        filters: &EventFilters,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<EventView>, i64)> {
        self.events.list(filters, limit, offset).await
    }

    async fn count_events_by_status(&self, organizer_id: Option<Uuid>) -> Result<EventStats> {
        self.events.count_by_status(organizer_id).await
    }

    async fn admit_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        joined_at: DateTime<Utc>,
    ) -> Result<AdmitOutcome> {
        self.participants.admit(event_id, user_id, joined_at).await
    }

    async fn find_active_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>> {
        self.participants.find_active(event_id, user_id).await
    }

    async fn count_active_participants(&self, event_id: Uuid) -> Result<i64> {
        self.participants.count_active(event_id).await
    }

    async fn update_active_participant_status(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        next: ParticipantStatus,
    ) -> Result<Option<Participant>> {
        self.participants
            .update_active_status(event_id, user_id, next)
            .await
    }

    async fn list_participants(&self, event_id: Uuid) -> Result<Vec<Participant>> {
        self.participants.list_for_event(event_id).await
    }
}
