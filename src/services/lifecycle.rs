//! Event lifecycle service
//!
//! Owns event creation, partial updates, the status state machine, and
//! listings. Every operation validates before touching storage and leans on
//! the store's atomic write methods, so an event and its detail record move
//! together or not at all.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PaginationConfig;
use crate::database::store::{EventChanges, EventStore, StatusWrite};
use crate::models::event::{
    derived_is_free, CreateEventRequest, Event, EventDetails, EventFilters, EventPage,
    EventStats, EventStatus, EventView, UpdateEventRequest,
};
use crate::models::participant::Participant;
use crate::utils::errors::{PlayOnError, Result};

/// Service owning the event status state machine and event/details writes
#[derive(Clone)]
pub struct EventLifecycleManager {
    store: Arc<dyn EventStore>,
    pagination: PaginationConfig,
}

impl EventLifecycleManager {
    pub fn new(store: Arc<dyn EventStore>, pagination: PaginationConfig) -> Self {
        Self { store, pagination }
    }

    /// Create an event, and its detail record when any detail field was
    /// supplied, as one atomic unit
    pub async fn create_event(&self, request: CreateEventRequest) -> Result<EventView> {
        request.validate()?;

        let now = Utc::now();
        let status = request.status.unwrap_or(EventStatus::Draft);
        let event = Event {
            id: Uuid::new_v4(),
            title: request.title.trim().to_string(),
            summary: request.summary,
            description: request.description,
            event_type: request.event_type,
            status,
            start_time: request.start_time,
            end_time: request.end_time,
            timezone: request.timezone,
            location: request.location,
            address: request.address,
            is_online: request.is_online,
            online_url: request.online_url,
            max_participants: request.max_participants,
            min_participants: request.min_participants,
            cost_per_person: request.cost_per_person,
            is_free: derived_is_free(request.cost_per_person),
            organizer_id: request.organizer_id,
            tags: request.tags,
            status_reason: None,
            published_at: (status == EventStatus::Published).then_some(now),
            created_at: now,
            updated_at: now,
        };

        let details = request.details.has_any().then(|| EventDetails {
            event_id: event.id,
            sport_type: request.details.sport_type.clone(),
            skill_level: request.details.skill_level.clone(),
            equipment: request.details.equipment.clone(),
            rules: request.details.rules.clone(),
            format: request.details.format.clone(),
            duration_minutes: request.details.duration_minutes,
            materials: request.details.materials.clone(),
            intensity: request.details.intensity.clone(),
            age_group: request.details.age_group.clone(),
            custom_fields: request.details.custom_fields.clone(),
            created_at: now,
            updated_at: now,
        });

        self.store
            .insert_event(event.clone(), details.clone())
            .await?;
        info!(event_id = %event.id, status = %event.status, organizer_id = %event.organizer_id, "Event created");

        Ok(EventView { event, details })
    }

    /// Read-only fetch of the assembled event view
    pub async fn get_event(&self, event_id: Uuid) -> Result<EventView> {
        self.store
            .fetch_event(event_id)
            .await?
            .ok_or(PlayOnError::EventNotFound { event_id })
    }

    /// Apply a partial update; only supplied fields change, and the merged
    /// result is re-validated before anything is written
    pub async fn update_event(
        &self,
        event_id: Uuid,
        request: UpdateEventRequest,
    ) -> Result<EventView> {
        if request.is_empty() {
            debug!(event_id = %event_id, "Empty update request, returning current state");
            return self.get_event(event_id).await;
        }

        let current = self.get_event(event_id).await?;
        let merged = request.merged_with(&current.event);
        merged.validate()?;

        // isFree stays derived: recompute whenever cost was touched or the
        // caller supplied the flag (validation already checked consistency)
        let is_free = (request.cost_per_person.is_some() || request.is_free.is_some())
            .then(|| derived_is_free(merged.cost_per_person));

        let changes = EventChanges {
            title: request.title.map(|t| t.trim().to_string()),
            summary: request.summary,
            description: request.description,
            event_type: request.event_type,
            start_time: request.start_time,
            end_time: request.end_time,
            timezone: request.timezone,
            location: request.location,
            address: request.address,
            is_online: request.is_online,
            online_url: request.online_url,
            max_participants: request.max_participants,
            min_participants: request.min_participants,
            cost_per_person: request.cost_per_person,
            is_free,
            tags: request.tags,
        };
        let details = request.details.has_any().then_some(request.details);

        let view = self
            .store
            .update_event(event_id, changes, details)
            .await?
            .ok_or(PlayOnError::EventNotFound { event_id })?;
        info!(event_id = %event_id, "Event updated");

        Ok(view)
    }

    /// Transition an event's status.
    ///
    /// Requesting the current status is an idempotent no-op. The write is a
    /// compare-and-set against the status this call observed, so two racing
    /// transitions cannot overwrite each other unnoticed.
    pub async fn change_status(
        &self,
        event_id: Uuid,
        next: EventStatus,
        reason: Option<String>,
    ) -> Result<EventView> {
        let current = self.get_event(event_id).await?;
        let from = current.event.status;

        if from == next {
            debug!(event_id = %event_id, status = %next, "Status unchanged, no-op");
            return Ok(current);
        }
        if !from.can_transition_to(next) {
            warn!(event_id = %event_id, from = %from, to = %next, "Illegal status transition rejected");
            return Err(PlayOnError::InvalidTransition { from, to: next });
        }

        let published_at = (next == EventStatus::Published
            && current.event.published_at.is_none())
        .then(Utc::now);

        match self
            .store
            .set_status(event_id, from, next, published_at, reason)
            .await?
        {
            StatusWrite::Applied(view) => {
                info!(event_id = %event_id, from = %from, to = %next, "Event status changed");
                Ok(view)
            }
            // Lost the race against another transition; report against the
            // state the event actually reached.
            StatusWrite::Missed => match self.store.fetch_event(event_id).await? {
                None => Err(PlayOnError::EventNotFound { event_id }),
                Some(view) if view.event.status == next => Ok(view),
                Some(view) => Err(PlayOnError::InvalidTransition {
                    from: view.event.status,
                    to: next,
                }),
            },
        }
    }

    /// Shorthand for the DRAFT -> PUBLISHED transition
    pub async fn publish_event(&self, event_id: Uuid) -> Result<EventView> {
        self.change_status(event_id, EventStatus::Published, None)
            .await
    }

    /// Archive the event; the only form of deletion in the system
    pub async fn archive_event(&self, event_id: Uuid) -> Result<EventView> {
        self.change_status(event_id, EventStatus::Archived, None)
            .await
    }

    /// Page through events matching the filters, startTime ascending.
    ///
    /// When no status filter is given, only PUBLISHED events are returned,
    /// so drafts never leak into general listings.
    pub async fn list_events(&self, filters: EventFilters) -> Result<EventPage> {
        let limit = filters
            .limit
            .unwrap_or(self.pagination.default_limit)
            .clamp(1, self.pagination.max_limit);
        let offset = filters.offset.unwrap_or(0).max(0);

        let mut effective = filters;
        effective.status = Some(effective.status.unwrap_or(EventStatus::Published));

        let (events, total) = self.store.list_events(&effective, limit, offset).await?;
        debug!(total = total, returned = events.len(), "Listed events");

        Ok(EventPage {
            events,
            total,
            has_more: offset + limit < total,
            page: offset / limit + 1,
            total_pages: (total + limit - 1) / limit,
        })
    }

    /// Per-status event counts, optionally scoped to one organizer
    pub async fn event_stats(&self, organizer_id: Option<Uuid>) -> Result<EventStats> {
        self.store.count_events_by_status(organizer_id).await
    }

    /// Roster for an event, oldest registration first
    pub async fn participants(&self, event_id: Uuid) -> Result<Vec<Participant>> {
        // Surface NotFound rather than an empty roster for unknown ids
        self.get_event(event_id).await?;
        self.store.list_participants(event_id).await
    }
}
