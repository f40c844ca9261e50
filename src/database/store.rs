//! Storage contract for the event core
//!
//! Every write that must be atomic (event + details, guarded admission,
//! compare-and-set status change) is a single method here, so an
//! implementation cannot accidentally split it across round trips.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::event::{
    Event, EventDetails, EventDetailsInput, EventFilters, EventStats, EventStatus, EventView,
};
use crate::models::participant::{Participant, ParticipantStatus};
use crate::utils::errors::Result;

/// Partial-update record for an event's core row.
///
/// `None` means "leave the stored value alone"; unsetting a field is not
/// expressible, matching the COALESCE update semantics of the SQL layer.
#[derive(Debug, Clone, Default)]
pub struct EventChanges {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<crate::models::event::EventType>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub is_online: Option<bool>,
    pub online_url: Option<String>,
    pub max_participants: Option<i32>,
    pub min_participants: Option<i32>,
    pub cost_per_person: Option<f64>,
    pub is_free: Option<bool>,
    pub tags: Option<Vec<String>>,
}

/// Result of a compare-and-set status write
#[derive(Debug, Clone)]
pub enum StatusWrite {
    /// The expected current status matched and the transition was applied
    Applied(EventView),
    /// The row no longer carries the expected status (or is gone); the
    /// caller re-reads and decides what that means
    Missed,
}

/// Result of a guarded admission attempt
#[derive(Debug, Clone)]
pub enum AdmitOutcome {
    Admitted(Participant),
    NotFound,
    NotJoinable(EventStatus),
    AlreadyRegistered,
    Full,
}

/// Storage handle the lifecycle manager and registration engine are built on.
///
/// Implemented by `PgEventStore` (sqlx/Postgres) and `MemoryEventStore`
/// (single-mutex in-process state with the same atomicity guarantees).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist a new event and its optional detail record as one unit;
    /// neither is observable without the other
    async fn insert_event(&self, event: Event, details: Option<EventDetails>) -> Result<()>;

    async fn fetch_event(&self, event_id: Uuid) -> Result<Option<EventView>>;

    /// Apply a partial update and upsert details in one unit. Returns the
    /// refreshed view, or `None` when the event does not exist.
    async fn update_event(
        &self,
        event_id: Uuid,
        changes: EventChanges,
        details: Option<EventDetailsInput>,
    ) -> Result<Option<EventView>>;

    /// Compare-and-set status transition. Applies only while the row still
    /// carries `expected`; `published_at` is written once and never
    /// overwritten; `reason` replaces the previous status metadata. A
    /// transition into ARCHIVED cascades the detail record in the same unit.
    async fn set_status(
        &self,
        event_id: Uuid,
        expected: EventStatus,
        next: EventStatus,
        published_at: Option<DateTime<Utc>>,
        reason: Option<String>,
    ) -> Result<StatusWrite>;

    /// Page of events matching the filters, ordered by start_time ascending,
    /// plus the total match count
    async fn list_events(
        &self,
        filters: &EventFilters,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<EventView>, i64)>;

    async fn count_events_by_status(&self, organizer_id: Option<Uuid>) -> Result<EventStats>;

    /// Admit a user into an event, enforcing status gating, active
    /// uniqueness, and the capacity limit inside one atomic unit. This is
    /// the only path that creates Participant records.
    async fn admit_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        joined_at: DateTime<Utc>,
    ) -> Result<AdmitOutcome>;

    async fn find_active_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>>;

    async fn count_active_participants(&self, event_id: Uuid) -> Result<i64>;

    /// Move a user's active (REGISTERED/CONFIRMED) record to `next`.
    /// Returns `None` when the user holds no active record.
    async fn update_active_participant_status(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        next: ParticipantStatus,
    ) -> Result<Option<Participant>>;

    /// Full roster for an event, ordered by joined_at ascending
    async fn list_participants(&self, event_id: Uuid) -> Result<Vec<Participant>>;
}
