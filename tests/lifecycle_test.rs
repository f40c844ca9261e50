//! Integration tests for the event lifecycle service

mod helpers;

use chrono::{Duration, Utc};
use uuid::Uuid;

use helpers::{create_request, event_in_status, published_request, test_factory};
use playon::models::event::{
    EventDetailsInput, EventFilters, EventStatus, EventType, UpdateEventRequest,
};
use playon::PlayOnError;

#[tokio::test]
async fn create_defaults_to_draft_and_free() {
    let factory = test_factory();

    let view = factory
        .lifecycle
        .create_event(create_request("Pickup Soccer", 10))
        .await
        .unwrap();

    assert_eq!(view.event.status, EventStatus::Draft);
    assert!(view.event.is_free);
    assert!(view.event.published_at.is_none());
    assert!(view.details.is_none());

    let fetched = factory.lifecycle.get_event(view.event.id).await.unwrap();
    assert_eq!(fetched.event.id, view.event.id);
    assert_eq!(fetched.event.title, "Pickup Soccer");
}

#[tokio::test]
async fn create_published_stamps_published_at() {
    let factory = test_factory();

    let view = factory
        .lifecycle
        .create_event(published_request("Evening Tennis", 4))
        .await
        .unwrap();

    assert_eq!(view.event.status, EventStatus::Published);
    assert!(view.event.published_at.is_some());
}

#[tokio::test]
async fn is_free_follows_cost() {
    let factory = test_factory();

    let mut request = create_request("Cooking Class", 8);
    request.cost_per_person = Some(25.0);
    let paid = factory.lifecycle.create_event(request).await.unwrap();
    assert!(!paid.event.is_free);

    let mut request = create_request("Free Cooking Class", 8);
    request.cost_per_person = Some(0.0);
    let free = factory.lifecycle.create_event(request).await.unwrap();
    assert!(free.event.is_free);
}

#[tokio::test]
async fn create_reports_all_field_errors_at_once() {
    let factory = test_factory();

    let mut request = create_request("ab", 0);
    request.location = None;
    let err = factory.lifecycle.create_event(request).await.unwrap_err();

    let fields = err.field_errors().expect("expected a validation error");
    assert!(fields.field("title").is_some());
    assert!(fields.field("maxParticipants").is_some());
    assert!(fields.field("location").is_some());
}

#[tokio::test]
async fn create_with_detail_fields_writes_details() {
    let factory = test_factory();

    let mut request = create_request("League Night", 12);
    request.details = EventDetailsInput {
        sport_type: Some("soccer".to_string()),
        skill_level: Some("intermediate".to_string()),
        custom_fields: Some(serde_json::json!({"field": "north pitch"})),
        ..Default::default()
    };

    let view = factory.lifecycle.create_event(request).await.unwrap();
    let details = view.details.expect("details should be created");
    assert_eq!(details.event_id, view.event.id);
    assert_eq!(details.sport_type.as_deref(), Some("soccer"));
    assert_eq!(details.skill_level.as_deref(), Some("intermediate"));
}

#[tokio::test]
async fn get_unknown_event_is_not_found() {
    let factory = test_factory();
    let missing = Uuid::new_v4();

    let err = factory.lifecycle.get_event(missing).await.unwrap_err();
    assert!(matches!(
        err,
        PlayOnError::EventNotFound { event_id } if event_id == missing
    ));
}

#[tokio::test]
async fn partial_update_leaves_other_fields_alone() {
    let factory = test_factory();

    let mut request = create_request("Board Game Night", 6);
    request.summary = Some("Strategy games".to_string());
    request.cost_per_person = Some(5.0);
    let created = factory.lifecycle.create_event(request).await.unwrap();

    let update = UpdateEventRequest {
        title: Some("Board Game Marathon".to_string()),
        ..Default::default()
    };
    let updated = factory
        .lifecycle
        .update_event(created.event.id, update)
        .await
        .unwrap();

    assert_eq!(updated.event.title, "Board Game Marathon");
    assert_eq!(updated.event.summary.as_deref(), Some("Strategy games"));
    assert_eq!(updated.event.cost_per_person, Some(5.0));
    assert!(!updated.event.is_free);
    assert_eq!(updated.event.max_participants, 6);
    assert_eq!(updated.event.organizer_id, created.event.organizer_id);
}

#[tokio::test]
async fn empty_update_is_a_noop() {
    let factory = test_factory();

    let created = factory
        .lifecycle
        .create_event(create_request("Morning Run", 15))
        .await
        .unwrap();

    let after = factory
        .lifecycle
        .update_event(created.event.id, UpdateEventRequest::default())
        .await
        .unwrap();

    assert_eq!(after.event.title, created.event.title);
    assert_eq!(after.event.updated_at, created.event.updated_at);

    let fetched = factory.lifecycle.get_event(created.event.id).await.unwrap();
    assert_eq!(fetched.event.updated_at, created.event.updated_at);
}

#[tokio::test]
async fn updating_cost_rederives_is_free() {
    let factory = test_factory();

    let created = factory
        .lifecycle
        .create_event(create_request("Wellness Workshop", 20))
        .await
        .unwrap();
    assert!(created.event.is_free);

    let update = UpdateEventRequest {
        cost_per_person: Some(12.5),
        ..Default::default()
    };
    let updated = factory
        .lifecycle
        .update_event(created.event.id, update)
        .await
        .unwrap();
    assert_eq!(updated.event.cost_per_person, Some(12.5));
    assert!(!updated.event.is_free);

    let update = UpdateEventRequest {
        cost_per_person: Some(0.0),
        ..Default::default()
    };
    let updated = factory
        .lifecycle
        .update_event(created.event.id, update)
        .await
        .unwrap();
    assert!(updated.event.is_free);
}

#[tokio::test]
async fn update_validates_the_merged_record() {
    let factory = test_factory();

    let created = factory
        .lifecycle
        .create_event(create_request("Volleyball Meetup", 8))
        .await
        .unwrap();

    // min above the existing max only shows up after merging
    let update = UpdateEventRequest {
        min_participants: Some(12),
        ..Default::default()
    };
    let err = factory
        .lifecycle
        .update_event(created.event.id, update)
        .await
        .unwrap_err();
    assert!(err
        .field_errors()
        .unwrap()
        .field("minParticipants")
        .is_some());

    // and the event is untouched
    let fetched = factory.lifecycle.get_event(created.event.id).await.unwrap();
    assert_eq!(fetched.event.min_participants, None);
}

#[tokio::test]
async fn update_upserts_details() {
    let factory = test_factory();

    let created = factory
        .lifecycle
        .create_event(create_request("Cricket Sunday", 22))
        .await
        .unwrap();
    assert!(created.details.is_none());

    // First detail write creates the record
    let update = UpdateEventRequest {
        details: EventDetailsInput {
            sport_type: Some("cricket".to_string()),
            equipment: Some("bring your own bat".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let view = factory
        .lifecycle
        .update_event(created.event.id, update)
        .await
        .unwrap();
    let details = view.details.expect("details created on first write");
    assert_eq!(details.sport_type.as_deref(), Some("cricket"));

    // Second write merges: supplied fields replace, others survive
    let update = UpdateEventRequest {
        details: EventDetailsInput {
            skill_level: Some("all levels".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let view = factory
        .lifecycle
        .update_event(created.event.id, update)
        .await
        .unwrap();
    let details = view.details.expect("details still present");
    assert_eq!(details.sport_type.as_deref(), Some("cricket"));
    assert_eq!(details.equipment.as_deref(), Some("bring your own bat"));
    assert_eq!(details.skill_level.as_deref(), Some("all levels"));
}

#[tokio::test]
async fn update_unknown_event_is_not_found() {
    let factory = test_factory();

    let update = UpdateEventRequest {
        title: Some("Ghost Event".to_string()),
        ..Default::default()
    };
    let err = factory
        .lifecycle
        .update_event(Uuid::new_v4(), update)
        .await
        .unwrap_err();
    assert!(matches!(err, PlayOnError::EventNotFound { .. }));
}

#[tokio::test]
async fn transition_matrix_matches_the_table() {
    let all = [
        EventStatus::Draft,
        EventStatus::Published,
        EventStatus::Cancelled,
        EventStatus::Completed,
        EventStatus::Archived,
    ];

    for from in all {
        for to in all {
            if from == to {
                continue;
            }
            let factory = test_factory();
            let id = event_in_status(&factory, from).await;
            let result = factory.lifecycle.change_status(id, to, None).await;

            if from.can_transition_to(to) {
                let view = result.unwrap_or_else(|e| panic!("{from} -> {to} should succeed: {e}"));
                assert_eq!(view.event.status, to);
            } else {
                let err = result.err().unwrap_or_else(|| {
                    panic!("{from} -> {to} should be rejected");
                });
                assert!(matches!(err, PlayOnError::InvalidTransition { .. }));
                // Illegal transitions leave the status unchanged
                let fetched = factory.lifecycle.get_event(id).await.unwrap();
                assert_eq!(fetched.event.status, from);
            }
        }
    }
}

#[tokio::test]
async fn publish_stamps_published_at_once_and_republish_is_noop() {
    let factory = test_factory();

    let created = factory
        .lifecycle
        .create_event(create_request("Pickup Soccer", 10))
        .await
        .unwrap();
    assert!(created.event.published_at.is_none());

    let published = factory.lifecycle.publish_event(created.event.id).await.unwrap();
    assert_eq!(published.event.status, EventStatus::Published);
    let stamp = published.event.published_at.expect("publishedAt stamped");

    // Re-publishing an already-PUBLISHED event is an idempotent no-op
    let again = factory.lifecycle.publish_event(created.event.id).await.unwrap();
    assert_eq!(again.event.status, EventStatus::Published);
    assert_eq!(again.event.published_at, Some(stamp));
}

#[tokio::test]
async fn status_change_records_the_reason() {
    let factory = test_factory();
    let id = event_in_status(&factory, EventStatus::Published).await;

    let view = factory
        .lifecycle
        .change_status(id, EventStatus::Cancelled, Some("rained out".to_string()))
        .await
        .unwrap();

    assert_eq!(view.event.status, EventStatus::Cancelled);
    assert_eq!(view.event.status_reason.as_deref(), Some("rained out"));
}

#[tokio::test]
async fn archiving_cascades_the_detail_record() {
    let factory = test_factory();

    let mut request = create_request("Retro Gaming Night", 16);
    request.event_type = EventType::VideoGames;
    request.details = EventDetailsInput {
        format: Some("tournament".to_string()),
        ..Default::default()
    };
    let created = factory.lifecycle.create_event(request).await.unwrap();
    assert!(created.details.is_some());

    let archived = factory.lifecycle.archive_event(created.event.id).await.unwrap();
    assert_eq!(archived.event.status, EventStatus::Archived);
    assert!(archived.details.is_none());

    // The event record itself survives archival
    let fetched = factory.lifecycle.get_event(created.event.id).await.unwrap();
    assert_eq!(fetched.event.status, EventStatus::Archived);
    assert!(fetched.details.is_none());
}

#[tokio::test]
async fn listings_default_to_published_only() {
    let factory = test_factory();

    factory
        .lifecycle
        .create_event(create_request("Hidden Draft", 5))
        .await
        .unwrap();
    let published = factory
        .lifecycle
        .create_event(published_request("Visible Event", 5))
        .await
        .unwrap();

    let page = factory
        .lifecycle
        .list_events(EventFilters::default())
        .await
        .unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.events[0].event.id, published.event.id);

    // Drafts are reachable only by asking for them
    let page = factory
        .lifecycle
        .list_events(EventFilters {
            status: Some(EventStatus::Draft),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.events[0].event.title, "Hidden Draft");
}

#[tokio::test]
async fn listings_filter_and_order_by_start_time() {
    let factory = test_factory();
    let organizer = Uuid::new_v4();

    let mut late = published_request("Late Tennis", 4);
    late.event_type = EventType::Tennis;
    late.start_time = Utc::now() + Duration::days(14);
    late.organizer_id = organizer;
    late.tags = vec!["outdoor".to_string()];
    factory.lifecycle.create_event(late).await.unwrap();

    let mut early = published_request("Early Tennis", 4);
    early.event_type = EventType::Tennis;
    early.start_time = Utc::now() + Duration::days(2);
    early.organizer_id = organizer;
    factory.lifecycle.create_event(early).await.unwrap();

    let mut online = published_request("Tech Talk", 100);
    online.event_type = EventType::Tech;
    online.is_online = true;
    online.online_url = Some("https://meet.example.com/tech".to_string());
    online.location = None;
    online.cost_per_person = Some(10.0);
    factory.lifecycle.create_event(online).await.unwrap();

    // Type filter plus ordering
    let page = factory
        .lifecycle
        .list_events(EventFilters {
            event_type: Some(EventType::Tennis),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.events[0].event.title, "Early Tennis");
    assert_eq!(page.events[1].event.title, "Late Tennis");

    // Organizer filter
    let page = factory
        .lifecycle
        .list_events(EventFilters {
            organizer_id: Some(organizer),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    // Online + paid filters single out the tech talk
    let page = factory
        .lifecycle
        .list_events(EventFilters {
            is_online: Some(true),
            is_free: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.events[0].event.title, "Tech Talk");

    // Tag overlap
    let page = factory
        .lifecycle
        .list_events(EventFilters {
            tags: vec!["outdoor".to_string()],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.events[0].event.title, "Late Tennis");

    // Date range keeps only the near event
    let page = factory
        .lifecycle
        .list_events(EventFilters {
            starts_before: Some(Utc::now() + Duration::days(5)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(page
        .events
        .iter()
        .all(|v| v.event.start_time <= Utc::now() + Duration::days(5)));
}

#[tokio::test]
async fn listing_pagination_math() {
    let factory = test_factory();

    for i in 0..5 {
        let mut request = published_request(&format!("Event {i}"), 10);
        request.start_time = Utc::now() + Duration::days(i);
        factory.lifecycle.create_event(request).await.unwrap();
    }

    let page = factory
        .lifecycle
        .list_events(EventFilters {
            limit: Some(2),
            offset: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.total, 5);
    assert_eq!(page.events.len(), 2);
    assert_eq!(page.page, 2);
    assert_eq!(page.total_pages, 3);
    assert!(page.has_more);

    let last = factory
        .lifecycle
        .list_events(EventFilters {
            limit: Some(2),
            offset: Some(4),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(last.events.len(), 1);
    assert!(!last.has_more);
    assert_eq!(last.page, 3);
}

#[tokio::test]
async fn listing_clamps_the_limit() {
    let factory = test_factory();

    factory
        .lifecycle
        .create_event(published_request("Lone Event", 10))
        .await
        .unwrap();

    // Far above max_limit; must not error, just clamp
    let page = factory
        .lifecycle
        .list_events(EventFilters {
            limit: Some(100_000),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.total_pages, 1);
}

#[tokio::test]
async fn stats_count_by_status_and_organizer() {
    let factory = test_factory();
    let organizer = Uuid::new_v4();

    let mut draft = create_request("Draft One", 5);
    draft.organizer_id = organizer;
    factory.lifecycle.create_event(draft).await.unwrap();

    let mut published = published_request("Published One", 5);
    published.organizer_id = organizer;
    let published = factory.lifecycle.create_event(published).await.unwrap();
    factory
        .lifecycle
        .change_status(published.event.id, EventStatus::Completed, None)
        .await
        .unwrap();

    factory
        .lifecycle
        .create_event(published_request("Someone Else's", 5))
        .await
        .unwrap();

    let all = factory.lifecycle.event_stats(None).await.unwrap();
    assert_eq!(all.total_events, 3);
    assert_eq!(all.published_events, 1);
    assert_eq!(all.draft_events, 1);
    assert_eq!(all.completed_events, 1);

    let scoped = factory.lifecycle.event_stats(Some(organizer)).await.unwrap();
    assert_eq!(scoped.total_events, 2);
    assert_eq!(scoped.published_events, 0);
    assert_eq!(scoped.completed_events, 1);
}

#[tokio::test]
async fn roster_requires_a_known_event() {
    let factory = test_factory();

    let err = factory
        .lifecycle
        .participants(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, PlayOnError::EventNotFound { .. }));

    let created = factory
        .lifecycle
        .create_event(published_request("Empty Roster", 5))
        .await
        .unwrap();
    let roster = factory
        .lifecycle
        .participants(created.event.id)
        .await
        .unwrap();
    assert!(roster.is_empty());
}
