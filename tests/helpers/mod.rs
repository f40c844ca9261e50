//! Shared helpers for integration tests

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use playon::config::Settings;
use playon::models::event::{CreateEventRequest, EventDetailsInput, EventStatus, EventType};
use playon::{MemoryEventStore, ServiceFactory};

/// Service factory over a fresh in-memory store
pub fn test_factory() -> ServiceFactory {
    let store = Arc::new(MemoryEventStore::new());
    ServiceFactory::new(store, &Settings::default())
}

/// Valid creation request for a physical event next week
pub fn create_request(title: &str, max_participants: i32) -> CreateEventRequest {
    CreateEventRequest {
        title: title.to_string(),
        summary: None,
        description: None,
        event_type: EventType::Soccer,
        start_time: Utc::now() + Duration::days(7),
        end_time: None,
        timezone: Some("America/New_York".to_string()),
        location: Some("Riverside Park".to_string()),
        address: None,
        is_online: false,
        online_url: None,
        max_participants,
        min_participants: None,
        cost_per_person: None,
        is_free: None,
        organizer_id: Uuid::new_v4(),
        tags: vec![],
        status: None,
        details: EventDetailsInput::default(),
    }
}

/// Same, created directly as PUBLISHED
pub fn published_request(title: &str, max_participants: i32) -> CreateEventRequest {
    CreateEventRequest {
        status: Some(EventStatus::Published),
        ..create_request(title, max_participants)
    }
}

/// Drive a fresh event into the given status through legal transitions;
/// returns the event id
pub async fn event_in_status(factory: &ServiceFactory, status: EventStatus) -> Uuid {
    let lifecycle = &factory.lifecycle;
    match status {
        EventStatus::Draft => {
            lifecycle
                .create_event(create_request("Status fixture", 10))
                .await
                .unwrap()
                .event
                .id
        }
        EventStatus::Published => {
            lifecycle
                .create_event(published_request("Status fixture", 10))
                .await
                .unwrap()
                .event
                .id
        }
        EventStatus::Cancelled => {
            let id = lifecycle
                .create_event(published_request("Status fixture", 10))
                .await
                .unwrap()
                .event
                .id;
            lifecycle
                .change_status(id, EventStatus::Cancelled, None)
                .await
                .unwrap();
            id
        }
        EventStatus::Completed => {
            let id = lifecycle
                .create_event(published_request("Status fixture", 10))
                .await
                .unwrap()
                .event
                .id;
            lifecycle
                .change_status(id, EventStatus::Completed, None)
                .await
                .unwrap();
            id
        }
        EventStatus::Archived => {
            let id = lifecycle
                .create_event(create_request("Status fixture", 10))
                .await
                .unwrap()
                .event
                .id;
            lifecycle.archive_event(id).await.unwrap();
            id
        }
    }
}
