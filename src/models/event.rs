//! Event model and lifecycle state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::utils::errors::{Result, ValidationErrors};

/// Closed set of activity types an event can be hosted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Soccer,
    Cricket,
    Tennis,
    Volleyball,
    Pickleball,
    VideoGames,
    Cooking,
    Tech,
    Wellness,
    Other,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Soccer => "SOCCER",
            EventType::Cricket => "CRICKET",
            EventType::Tennis => "TENNIS",
            EventType::Volleyball => "VOLLEYBALL",
            EventType::Pickleball => "PICKLEBALL",
            EventType::VideoGames => "VIDEO_GAMES",
            EventType::Cooking => "COOKING",
            EventType::Tech => "TECH",
            EventType::Wellness => "WELLNESS",
            EventType::Other => "OTHER",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "SOCCER" => Ok(EventType::Soccer),
            "CRICKET" => Ok(EventType::Cricket),
            "TENNIS" => Ok(EventType::Tennis),
            "VOLLEYBALL" => Ok(EventType::Volleyball),
            "PICKLEBALL" => Ok(EventType::Pickleball),
            "VIDEO_GAMES" => Ok(EventType::VideoGames),
            "COOKING" => Ok(EventType::Cooking),
            "TECH" => Ok(EventType::Tech),
            "WELLNESS" => Ok(EventType::Wellness),
            "OTHER" => Ok(EventType::Other),
            other => Err(format!("unknown event type: {other}")),
        }
    }
}

/// Lifecycle status of an event
///
/// The transition table is the authority for `change_status`:
/// DRAFT -> PUBLISHED | ARCHIVED, PUBLISHED -> CANCELLED | COMPLETED |
/// ARCHIVED, CANCELLED -> ARCHIVED, COMPLETED -> ARCHIVED. ARCHIVED is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
    Completed,
    Archived,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Draft => "DRAFT",
            EventStatus::Published => "PUBLISHED",
            EventStatus::Cancelled => "CANCELLED",
            EventStatus::Completed => "COMPLETED",
            EventStatus::Archived => "ARCHIVED",
        }
    }

    /// Whether the state machine permits `self -> next`
    pub fn can_transition_to(self, next: EventStatus) -> bool {
        use EventStatus::*;
        matches!(
            (self, next),
            (Draft, Published)
                | (Draft, Archived)
                | (Published, Cancelled)
                | (Published, Completed)
                | (Published, Archived)
                | (Cancelled, Archived)
                | (Completed, Archived)
        )
    }

    /// ARCHIVED has no outgoing transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, EventStatus::Archived)
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(EventStatus::Draft),
            "PUBLISHED" => Ok(EventStatus::Published),
            "CANCELLED" => Ok(EventStatus::Cancelled),
            "COMPLETED" => Ok(EventStatus::Completed),
            "ARCHIVED" => Ok(EventStatus::Archived),
            other => Err(format!("unknown event status: {other}")),
        }
    }
}

/// Core event record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub event_type: EventType,
    pub status: EventStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub timezone: Option<String>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub is_online: bool,
    pub online_url: Option<String>,
    pub max_participants: i32,
    pub min_participants: Option<i32>,
    pub cost_per_person: Option<f64>,
    pub is_free: bool,
    pub organizer_id: Uuid,
    pub tags: Vec<String>,
    /// Auxiliary metadata from the most recent status change
    pub status_reason: Option<String>,
    /// Set exactly once, on the first transition into PUBLISHED
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sport/activity-specific metadata, at most one record per event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub event_id: Uuid,
    pub sport_type: Option<String>,
    pub skill_level: Option<String>,
    pub equipment: Option<String>,
    pub rules: Option<String>,
    pub format: Option<String>,
    pub duration_minutes: Option<i32>,
    pub materials: Option<String>,
    pub intensity: Option<String>,
    pub age_group: Option<String>,
    pub custom_fields: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Assembled read model: the event plus its optional detail record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    #[serde(rename = "eventDetails")]
    pub details: Option<EventDetails>,
}

/// Detail fields accepted on create/update requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetailsInput {
    #[serde(default)]
    pub sport_type: Option<String>,
    #[serde(default)]
    pub skill_level: Option<String>,
    #[serde(default)]
    pub equipment: Option<String>,
    #[serde(default)]
    pub rules: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub materials: Option<String>,
    #[serde(default)]
    pub intensity: Option<String>,
    #[serde(default)]
    pub age_group: Option<String>,
    #[serde(default)]
    pub custom_fields: Option<serde_json::Value>,
}

impl EventDetailsInput {
    /// True when at least one detail field was supplied
    pub fn has_any(&self) -> bool {
        self.sport_type.is_some()
            || self.skill_level.is_some()
            || self.equipment.is_some()
            || self.rules.is_some()
            || self.format.is_some()
            || self.duration_minutes.is_some()
            || self.materials.is_some()
            || self.intensity.is_some()
            || self.age_group.is_some()
            || self.custom_fields.is_some()
    }
}

/// Request payload for creating an event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub event_type: EventType,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub online_url: Option<String>,
    pub max_participants: i32,
    #[serde(default)]
    pub min_participants: Option<i32>,
    #[serde(default)]
    pub cost_per_person: Option<f64>,
    #[serde(default)]
    pub is_free: Option<bool>,
    pub organizer_id: Uuid,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Initial status; defaults to DRAFT when omitted
    #[serde(default)]
    pub status: Option<EventStatus>,
    #[serde(flatten)]
    pub details: EventDetailsInput,
}

/// isFree is derived, never trusted: free iff no cost or zero cost
pub fn derived_is_free(cost_per_person: Option<f64>) -> bool {
    cost_per_person.map_or(true, |cost| cost == 0.0)
}

impl CreateEventRequest {
    /// Validate the request before any storage interaction.
    ///
    /// Field keys in the error map use the wire names from the JSON contract.
    pub fn validate(&self) -> Result<()> {
        let mut errors = ValidationErrors::new();

        if self.title.trim().len() < 3 {
            errors.add("title", "must be at least 3 characters");
        }
        if self.max_participants < 1 {
            errors.add("maxParticipants", "must be at least 1");
        }
        if let Some(min) = self.min_participants {
            if min < 1 {
                errors.add("minParticipants", "must be at least 1");
            } else if min > self.max_participants {
                errors.add("minParticipants", "cannot exceed maxParticipants");
            }
        }
        if let Some(end) = self.end_time {
            if end < self.start_time {
                errors.add("endTime", "must not be before startTime");
            }
        }
        if self.is_online {
            if self.online_url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                errors.add("onlineUrl", "is required for online events");
            }
        } else if self.location.as_deref().map_or(true, |l| l.trim().is_empty()) {
            errors.add("location", "is required unless the event is online");
        }
        if let Some(cost) = self.cost_per_person {
            if cost < 0.0 {
                errors.add("costPerPerson", "cannot be negative");
            }
        }
        if let Some(explicit) = self.is_free {
            if explicit != derived_is_free(self.cost_per_person) {
                errors.add("isFree", "contradicts costPerPerson");
            }
        }
        if let Some(status) = self.status {
            if !matches!(status, EventStatus::Draft | EventStatus::Published) {
                errors.add("status", "new events start as DRAFT or PUBLISHED");
            }
        }

        errors.into_result()
    }
}

/// Request payload for partially updating an event.
///
/// Only supplied fields are applied; a supplied field replaces the stored
/// value but an absent field never clears one. Status and organizer are not
/// updatable here: status moves only through `change_status`, and ownership
/// is immutable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_type: Option<EventType>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub is_online: Option<bool>,
    #[serde(default)]
    pub online_url: Option<String>,
    #[serde(default)]
    pub max_participants: Option<i32>,
    #[serde(default)]
    pub min_participants: Option<i32>,
    #[serde(default)]
    pub cost_per_person: Option<f64>,
    #[serde(default)]
    pub is_free: Option<bool>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(flatten)]
    pub details: EventDetailsInput,
}

impl UpdateEventRequest {
    /// True when no event field and no detail field was supplied
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.summary.is_none()
            && self.description.is_none()
            && self.event_type.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.timezone.is_none()
            && self.location.is_none()
            && self.address.is_none()
            && self.is_online.is_none()
            && self.online_url.is_none()
            && self.max_participants.is_none()
            && self.min_participants.is_none()
            && self.cost_per_person.is_none()
            && self.is_free.is_none()
            && self.tags.is_none()
            && !self.details.has_any()
    }

    /// Project the update onto an existing event, producing the merged
    /// candidate that gets re-validated before anything is written
    pub fn merged_with(&self, event: &Event) -> CreateEventRequest {
        CreateEventRequest {
            title: self.title.clone().unwrap_or_else(|| event.title.clone()),
            summary: self.summary.clone().or_else(|| event.summary.clone()),
            description: self
                .description
                .clone()
                .or_else(|| event.description.clone()),
            event_type: self.event_type.unwrap_or(event.event_type),
            start_time: self.start_time.unwrap_or(event.start_time),
            end_time: self.end_time.or(event.end_time),
            timezone: self.timezone.clone().or_else(|| event.timezone.clone()),
            location: self.location.clone().or_else(|| event.location.clone()),
            address: self.address.clone().or_else(|| event.address.clone()),
            is_online: self.is_online.unwrap_or(event.is_online),
            online_url: self
                .online_url
                .clone()
                .or_else(|| event.online_url.clone()),
            max_participants: self.max_participants.unwrap_or(event.max_participants),
            min_participants: self.min_participants.or(event.min_participants),
            cost_per_person: self.cost_per_person.or(event.cost_per_person),
            is_free: self.is_free,
            organizer_id: event.organizer_id,
            tags: self.tags.clone().unwrap_or_else(|| event.tags.clone()),
            status: None,
            details: self.details.clone(),
        }
    }
}

/// Optional predicates for event listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilters {
    #[serde(default)]
    pub event_type: Option<EventType>,
    /// Defaults to PUBLISHED when unspecified, so drafts stay invisible
    #[serde(default)]
    pub status: Option<EventStatus>,
    #[serde(default)]
    pub organizer_id: Option<Uuid>,
    #[serde(default)]
    pub is_online: Option<bool>,
    #[serde(default)]
    pub is_free: Option<bool>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub starts_after: Option<DateTime<Utc>>,
    #[serde(default)]
    pub starts_before: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// One page of an event listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    pub events: Vec<EventView>,
    pub total: i64,
    pub has_more: bool,
    pub page: i64,
    pub total_pages: i64,
}

/// Per-status event counts, optionally scoped to one organizer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub total_events: i64,
    pub published_events: i64,
    pub draft_events: i64,
    pub completed_events: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> CreateEventRequest {
        CreateEventRequest {
            title: "Pickup Soccer".to_string(),
            summary: None,
            description: None,
            event_type: EventType::Soccer,
            start_time: Utc::now(),
            end_time: None,
            timezone: None,
            location: Some("Riverside Park".to_string()),
            address: None,
            is_online: false,
            online_url: None,
            max_participants: 10,
            min_participants: None,
            cost_per_person: None,
            is_free: None,
            organizer_id: Uuid::new_v4(),
            tags: vec![],
            status: None,
            details: EventDetailsInput::default(),
        }
    }

    #[test]
    fn legal_transitions_follow_the_table() {
        use EventStatus::*;
        let legal = [
            (Draft, Published),
            (Draft, Archived),
            (Published, Cancelled),
            (Published, Completed),
            (Published, Archived),
            (Cancelled, Archived),
            (Completed, Archived),
        ];
        let all = [Draft, Published, Cancelled, Completed, Archived];

        for from in all {
            for to in all {
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{from} -> {to} should be {expected}"
                );
            }
        }
    }

    #[test]
    fn archived_is_terminal() {
        assert!(EventStatus::Archived.is_terminal());
        assert!(!EventStatus::Completed.is_terminal());
        for to in [
            EventStatus::Draft,
            EventStatus::Published,
            EventStatus::Cancelled,
            EventStatus::Completed,
            EventStatus::Archived,
        ] {
            assert!(!EventStatus::Archived.can_transition_to(to));
        }
    }

    #[test]
    fn status_and_type_round_trip_through_strings() {
        for status in [
            EventStatus::Draft,
            EventStatus::Published,
            EventStatus::Cancelled,
            EventStatus::Completed,
            EventStatus::Archived,
        ] {
            assert_eq!(status.as_str().parse::<EventStatus>().unwrap(), status);
        }
        for event_type in [
            EventType::Soccer,
            EventType::VideoGames,
            EventType::Pickleball,
            EventType::Other,
        ] {
            assert_eq!(
                event_type.as_str().parse::<EventType>().unwrap(),
                event_type
            );
        }
        assert!("KARAOKE".parse::<EventType>().is_err());
        assert!("DELETED".parse::<EventStatus>().is_err());
    }

    #[test]
    fn is_free_derivation() {
        assert!(derived_is_free(None));
        assert!(derived_is_free(Some(0.0)));
        assert!(!derived_is_free(Some(5.0)));
    }

    #[test]
    fn valid_request_passes() {
        assert!(base_request().validate().is_ok());
    }

    #[test]
    fn short_title_is_rejected() {
        let mut request = base_request();
        request.title = "ab".to_string();
        let err = request.validate().unwrap_err();
        assert!(err.field_errors().unwrap().field("title").is_some());
    }

    #[test]
    fn capacity_below_one_is_rejected() {
        let mut request = base_request();
        request.max_participants = 0;
        let err = request.validate().unwrap_err();
        assert!(err
            .field_errors()
            .unwrap()
            .field("maxParticipants")
            .is_some());
    }

    #[test]
    fn min_above_max_is_rejected() {
        let mut request = base_request();
        request.min_participants = Some(20);
        let err = request.validate().unwrap_err();
        assert!(err
            .field_errors()
            .unwrap()
            .field("minParticipants")
            .is_some());
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut request = base_request();
        request.end_time = Some(request.start_time - chrono::Duration::hours(1));
        let err = request.validate().unwrap_err();
        assert!(err.field_errors().unwrap().field("endTime").is_some());
    }

    #[test]
    fn location_required_unless_online() {
        let mut request = base_request();
        request.location = None;
        let err = request.validate().unwrap_err();
        assert!(err.field_errors().unwrap().field("location").is_some());

        // Online with a URL is fine without a physical location
        let mut request = base_request();
        request.location = None;
        request.is_online = true;
        request.online_url = Some("https://meet.example.com/soccer".to_string());
        assert!(request.validate().is_ok());

        // Online without a URL is not
        let mut request = base_request();
        request.is_online = true;
        request.online_url = None;
        let err = request.validate().unwrap_err();
        assert!(err.field_errors().unwrap().field("onlineUrl").is_some());
    }

    #[test]
    fn both_location_and_online_url_are_allowed() {
        let mut request = base_request();
        request.is_online = true;
        request.online_url = Some("https://stream.example.com".to_string());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn negative_cost_is_rejected() {
        let mut request = base_request();
        request.cost_per_person = Some(-1.0);
        let err = request.validate().unwrap_err();
        assert!(err.field_errors().unwrap().field("costPerPerson").is_some());
    }

    #[test]
    fn inconsistent_is_free_flag_is_rejected() {
        let mut request = base_request();
        request.cost_per_person = Some(15.0);
        request.is_free = Some(true);
        let err = request.validate().unwrap_err();
        assert!(err.field_errors().unwrap().field("isFree").is_some());

        let mut request = base_request();
        request.cost_per_person = Some(15.0);
        request.is_free = Some(false);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn terminal_creation_status_is_rejected() {
        let mut request = base_request();
        request.status = Some(EventStatus::Archived);
        let err = request.validate().unwrap_err();
        assert!(err.field_errors().unwrap().field("status").is_some());

        let mut request = base_request();
        request.status = Some(EventStatus::Published);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(UpdateEventRequest::default().is_empty());

        let update = UpdateEventRequest {
            title: Some("New title".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());

        let update = UpdateEventRequest {
            details: EventDetailsInput {
                skill_level: Some("beginner".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn wire_enums_use_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&EventType::VideoGames).unwrap(),
            "\"VIDEO_GAMES\""
        );
        assert_eq!(
            serde_json::from_str::<EventStatus>("\"PUBLISHED\"").unwrap(),
            EventStatus::Published
        );
    }
}
