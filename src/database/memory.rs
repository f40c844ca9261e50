//! In-process implementation of the storage contract
//!
//! Holds the whole state behind one async mutex, so every contract method is
//! trivially atomic. Used by the test suite and for local development
//! without a Postgres instance.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::database::store::{AdmitOutcome, EventChanges, EventStore, StatusWrite};
use crate::models::event::{
    Event, EventDetails, EventDetailsInput, EventFilters, EventStats, EventStatus, EventView,
};
use crate::models::participant::{Participant, ParticipantStatus};
use crate::utils::errors::Result;

#[derive(Default)]
struct MemoryState {
    events: HashMap<Uuid, Event>,
    details: HashMap<Uuid, EventDetails>,
    participants: Vec<Participant>,
}

impl MemoryState {
    fn view(&self, event_id: Uuid) -> Option<EventView> {
        self.events.get(&event_id).map(|event| EventView {
            event: event.clone(),
            details: self.details.get(&event_id).cloned(),
        })
    }

    fn active_count(&self, event_id: Uuid) -> i64 {
        self.participants
            .iter()
            .filter(|p| p.event_id == event_id && p.status.counts_toward_capacity())
            .count() as i64
    }

    fn matches(&self, event: &Event, filters: &EventFilters) -> bool {
        if let Some(event_type) = filters.event_type {
            if event.event_type != event_type {
                return false;
            }
        }
        if let Some(status) = filters.status {
            if event.status != status {
                return false;
            }
        }
        if let Some(organizer_id) = filters.organizer_id {
            if event.organizer_id != organizer_id {
                return false;
            }
        }
        if let Some(is_online) = filters.is_online {
            if event.is_online != is_online {
                return false;
            }
        }
        if let Some(is_free) = filters.is_free {
            if event.is_free != is_free {
                return false;
            }
        }
        if !filters.tags.is_empty() && !filters.tags.iter().any(|tag| event.tags.contains(tag)) {
            return false;
        }
        if let Some(after) = filters.starts_after {
            if event.start_time < after {
                return false;
            }
        }
        if let Some(before) = filters.starts_before {
            if event.start_time > before {
                return false;
            }
        }
        true
    }
}

/// In-memory event store
pub struct MemoryEventStore {
    state: Mutex<MemoryState>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
        }
    }
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_details(
    existing: Option<EventDetails>,
    event_id: Uuid,
    input: &EventDetailsInput,
    now: DateTime<Utc>,
) -> EventDetails {
    match existing {
        Some(mut details) => {
            if input.sport_type.is_some() {
                details.sport_type = input.sport_type.clone();
            }
            if input.skill_level.is_some() {
                details.skill_level = input.skill_level.clone();
            }
            if input.equipment.is_some() {
                details.equipment = input.equipment.clone();
            }
            if input.rules.is_some() {
                details.rules = input.rules.clone();
            }
            if input.format.is_some() {
                details.format = input.format.clone();
            }
            if input.duration_minutes.is_some() {
                details.duration_minutes = input.duration_minutes;
            }
            if input.materials.is_some() {
                details.materials = input.materials.clone();
            }
            if input.intensity.is_some() {
                details.intensity = input.intensity.clone();
            }
            if input.age_group.is_some() {
                details.age_group = input.age_group.clone();
            }
            if input.custom_fields.is_some() {
                details.custom_fields = input.custom_fields.clone();
            }
            details.updated_at = now;
            details
        }
        None => EventDetails {
            event_id,
            sport_type: input.sport_type.clone(),
            skill_level: input.skill_level.clone(),
            equipment: input.equipment.clone(),
            rules: input.rules.clone(),
            format: input.format.clone(),
            duration_minutes: input.duration_minutes,
            materials: input.materials.clone(),
            intensity: input.intensity.clone(),
            age_group: input.age_group.clone(),
            custom_fields: input.custom_fields.clone(),
            created_at: now,
            updated_at: now,
        },
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert_event(&self, event: Event, details: Option<EventDetails>) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(details) = details {
            state.details.insert(event.id, details);
        }
        state.events.insert(event.id, event);
        Ok(())
    }

    async fn fetch_event(&self, event_id: Uuid) -> Result<Option<EventView>> {
        let state = self.state.lock().await;
        Ok(state.view(event_id))
    }

    async fn update_event(
        &self,
        event_id: Uuid,
        changes: EventChanges,
        details: Option<EventDetailsInput>,
    ) -> Result<Option<EventView>> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        match state.events.get_mut(&event_id) {
            None => return Ok(None),
            Some(event) => {
                if let Some(title) = changes.title {
                    event.title = title;
                }
                if changes.summary.is_some() {
                    event.summary = changes.summary;
                }
                if changes.description.is_some() {
                    event.description = changes.description;
                }
                if let Some(event_type) = changes.event_type {
                    event.event_type = event_type;
                }
                if let Some(start_time) = changes.start_time {
                    event.start_time = start_time;
                }
                if changes.end_time.is_some() {
                    event.end_time = changes.end_time;
                }
                if changes.timezone.is_some() {
                    event.timezone = changes.timezone;
                }
                if changes.location.is_some() {
                    event.location = changes.location;
                }
                if changes.address.is_some() {
                    event.address = changes.address;
                }
                if let Some(is_online) = changes.is_online {
                    event.is_online = is_online;
                }
                if changes.online_url.is_some() {
                    event.online_url = changes.online_url;
                }
                if let Some(max_participants) = changes.max_participants {
                    event.max_participants = max_participants;
                }
                if changes.min_participants.is_some() {
                    event.min_participants = changes.min_participants;
                }
                if changes.cost_per_person.is_some() {
                    event.cost_per_person = changes.cost_per_person;
                }
                if let Some(is_free) = changes.is_free {
                    event.is_free = is_free;
                }
                if let Some(tags) = changes.tags {
                    event.tags = tags;
                }
                event.updated_at = now;
            }
        }

        if let Some(input) = details {
            let existing = state.details.remove(&event_id);
            let merged = merge_details(existing, event_id, &input, now);
            state.details.insert(event_id, merged);
        }

        Ok(state.view(event_id))
    }

    async fn set_status(
        &self,
        event_id: Uuid,
        expected: EventStatus,
        next: EventStatus,
        published_at: Option<DateTime<Utc>>,
        reason: Option<String>,
    ) -> Result<StatusWrite> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        match state.events.get_mut(&event_id) {
            Some(event) if event.status == expected => {
                event.status = next;
                if event.published_at.is_none() {
                    event.published_at = published_at;
                }
                event.status_reason = reason;
                event.updated_at = now;
            }
            _ => return Ok(StatusWrite::Missed),
        }

        if next == EventStatus::Archived {
            state.details.remove(&event_id);
        }

        Ok(StatusWrite::Applied(state.view(event_id).ok_or_else(
            || crate::utils::errors::PlayOnError::Corrupt("event vanished mid-write".to_string()),
        )?))
    }

    async fn list_events(
        &self,
        filters: &EventFilters,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<EventView>, i64)> {
        let state = self.state.lock().await;

        let mut matched: Vec<&Event> = state
            .events
            .values()
            .filter(|event| state.matches(event, filters))
            .collect();
        matched.sort_by_key(|event| event.start_time);

        let total = matched.len() as i64;
        let page = matched
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|event| EventView {
                event: event.clone(),
                details: state.details.get(&event.id).cloned(),
            })
            .collect();

        Ok((page, total))
    }

    async fn count_events_by_status(&self, organizer_id: Option<Uuid>) -> Result<EventStats> {
        let state = self.state.lock().await;
        let mut stats = EventStats {
            total_events: 0,
            published_events: 0,
            draft_events: 0,
            completed_events: 0,
        };

        for event in state.events.values() {
            if let Some(organizer_id) = organizer_id {
                if event.organizer_id != organizer_id {
                    continue;
                }
            }
            stats.total_events += 1;
            match event.status {
                EventStatus::Published => stats.published_events += 1,
                EventStatus::Draft => stats.draft_events += 1,
                EventStatus::Completed => stats.completed_events += 1,
                _ => {}
            }
        }

        Ok(stats)
    }

    async fn admit_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        joined_at: DateTime<Utc>,
    ) -> Result<AdmitOutcome> {
        // One guard across the whole check-then-insert, so concurrent calls
        // serialize exactly as the capacity invariant requires.
        let mut state = self.state.lock().await;

        let (status, max_participants) = match state.events.get(&event_id) {
            Some(event) => (event.status, event.max_participants),
            None => return Ok(AdmitOutcome::NotFound),
        };
        if status != EventStatus::Published {
            return Ok(AdmitOutcome::NotJoinable(status));
        }
        if state
            .participants
            .iter()
            .any(|p| p.event_id == event_id && p.user_id == user_id && p.status.counts_toward_capacity())
        {
            return Ok(AdmitOutcome::AlreadyRegistered);
        }
        if state.active_count(event_id) >= max_participants as i64 {
            return Ok(AdmitOutcome::Full);
        }

        let participant = Participant::new(event_id, user_id, joined_at);
        state.participants.push(participant.clone());
        Ok(AdmitOutcome::Admitted(participant))
    }

    async fn find_active_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>> {
        let state = self.state.lock().await;
        Ok(state
            .participants
            .iter()
            .find(|p| {
                p.event_id == event_id && p.user_id == user_id && p.status.counts_toward_capacity()
            })
            .cloned())
    }

    async fn count_active_participants(&self, event_id: Uuid) -> Result<i64> {
        let state = self.state.lock().await;
        Ok(state.active_count(event_id))
    }

    async fn update_active_participant_status(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        next: ParticipantStatus,
    ) -> Result<Option<Participant>> {
        let mut state = self.state.lock().await;
        let participant = state.participants.iter_mut().find(|p| {
            p.event_id == event_id && p.user_id == user_id && p.status.counts_toward_capacity()
        });

        Ok(participant.map(|p| {
            p.status = next;
            p.clone()
        }))
    }

    async fn list_participants(&self, event_id: Uuid) -> Result<Vec<Participant>> {
        let state = self.state.lock().await;
        let mut roster: Vec<Participant> = state
            .participants
            .iter()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect();
        roster.sort_by_key(|p| p.joined_at);
        Ok(roster)
    }
}
