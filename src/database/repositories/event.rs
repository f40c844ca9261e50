//! Event repository implementation
//!
//! Owns all SQL touching the events and event_details tables. Every
//! multi-write here runs inside one transaction, so an event and its detail
//! record can never be observed half-written.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::store::{EventChanges, StatusWrite};
use crate::models::event::{
    Event, EventDetails, EventDetailsInput, EventFilters, EventStats, EventStatus, EventView,
};
use crate::utils::errors::{PlayOnError, Result};

const EVENT_COLUMNS: &str = "id, title, summary, description, event_type, status, start_time, \
     end_time, timezone, location, address, is_online, online_url, max_participants, \
     min_participants, cost_per_person, is_free, organizer_id, tags, status_reason, \
     published_at, created_at, updated_at";

const DETAILS_COLUMNS: &str = "event_id, sport_type, skill_level, equipment, rules, format, \
     duration_minutes, materials, intensity, age_group, custom_fields, created_at, updated_at";

#[derive(FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    summary: Option<String>,
    description: Option<String>,
    event_type: String,
    status: String,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    timezone: Option<String>,
    location: Option<String>,
    address: Option<String>,
    is_online: bool,
    online_url: Option<String>,
    max_participants: i32,
    min_participants: Option<i32>,
    cost_per_person: Option<f64>,
    is_free: bool,
    organizer_id: Uuid,
    tags: Vec<String>,
    status_reason: Option<String>,
    published_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = PlayOnError;

    fn try_from(row: EventRow) -> Result<Event> {
        Ok(Event {
            id: row.id,
            title: row.title,
            summary: row.summary,
            description: row.description,
            event_type: row
                .event_type
                .parse()
                .map_err(PlayOnError::Corrupt)?,
            status: row.status.parse().map_err(PlayOnError::Corrupt)?,
            start_time: row.start_time,
            end_time: row.end_time,
            timezone: row.timezone,
            location: row.location,
            address: row.address,
            is_online: row.is_online,
            online_url: row.online_url,
            max_participants: row.max_participants,
            min_participants: row.min_participants,
            cost_per_person: row.cost_per_person,
            is_free: row.is_free,
            organizer_id: row.organizer_id,
            tags: row.tags,
            status_reason: row.status_reason,
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct DetailsRow {
    event_id: Uuid,
    sport_type: Option<String>,
    skill_level: Option<String>,
    equipment: Option<String>,
    rules: Option<String>,
    format: Option<String>,
    duration_minutes: Option<i32>,
    materials: Option<String>,
    intensity: Option<String>,
    age_group: Option<String>,
    custom_fields: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DetailsRow> for EventDetails {
    fn from(row: DetailsRow) -> EventDetails {
        EventDetails {
            event_id: row.event_id,
            sport_type: row.sport_type,
            skill_level: row.skill_level,
            equipment: row.equipment,
            rules: row.rules,
            format: row.format,
            duration_minutes: row.duration_minutes,
            materials: row.materials,
            intensity: row.intensity,
            age_group: row.age_group,
            custom_fields: row.custom_fields,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an event and its optional detail record in one transaction
    pub async fn insert(&self, event: &Event, details: Option<&EventDetails>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO events (id, title, summary, description, event_type, status, start_time,
                end_time, timezone, location, address, is_online, online_url, max_participants,
                min_participants, cost_per_person, is_free, organizer_id, tags, status_reason,
                published_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                $18, $19, $20, $21, $22, $23)
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.summary)
        .bind(&event.description)
        .bind(event.event_type.as_str())
        .bind(event.status.as_str())
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(&event.timezone)
        .bind(&event.location)
        .bind(&event.address)
        .bind(event.is_online)
        .bind(&event.online_url)
        .bind(event.max_participants)
        .bind(event.min_participants)
        .bind(event.cost_per_person)
        .bind(event.is_free)
        .bind(event.organizer_id)
        .bind(&event.tags)
        .bind(&event.status_reason)
        .bind(event.published_at)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&mut *tx)
        .await?;

        if let Some(details) = details {
            sqlx::query(
                r#"
                INSERT INTO event_details (event_id, sport_type, skill_level, equipment, rules,
                    format, duration_minutes, materials, intensity, age_group, custom_fields,
                    created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                "#,
            )
            .bind(details.event_id)
            .bind(&details.sport_type)
            .bind(&details.skill_level)
            .bind(&details.equipment)
            .bind(&details.rules)
            .bind(&details.format)
            .bind(details.duration_minutes)
            .bind(&details.materials)
            .bind(&details.intensity)
            .bind(&details.age_group)
            .bind(&details.custom_fields)
            .bind(details.created_at)
            .bind(details.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Fetch an event with its detail record
    pub async fn fetch(&self, event_id: Uuid) -> Result<Option<EventView>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let details = self.fetch_details(event_id).await?;
        Ok(Some(EventView {
            event: row.try_into()?,
            details,
        }))
    }

    async fn fetch_details(&self, event_id: Uuid) -> Result<Option<EventDetails>> {
        let row = sqlx::query_as::<_, DetailsRow>(&format!(
            "SELECT {DETAILS_COLUMNS} FROM event_details WHERE event_id = $1"
        ))
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Partial update plus detail upsert, as one transaction.
    ///
    /// Unsupplied fields stay untouched through COALESCE; the detail upsert
    /// merges supplied fields into an existing record or creates a new one.
    pub async fn update(
        &self,
        event_id: Uuid,
        changes: EventChanges,
        details: Option<EventDetailsInput>,
    ) -> Result<Option<EventView>> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            UPDATE events
            SET title = COALESCE($2, title),
                summary = COALESCE($3, summary),
                description = COALESCE($4, description),
                event_type = COALESCE($5, event_type),
                start_time = COALESCE($6, start_time),
                end_time = COALESCE($7, end_time),
                timezone = COALESCE($8, timezone),
                location = COALESCE($9, location),
                address = COALESCE($10, address),
                is_online = COALESCE($11, is_online),
                online_url = COALESCE($12, online_url),
                max_participants = COALESCE($13, max_participants),
                min_participants = COALESCE($14, min_participants),
                cost_per_person = COALESCE($15, cost_per_person),
                is_free = COALESCE($16, is_free),
                tags = COALESCE($17, tags),
                updated_at = $18
            WHERE id = $1
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(&changes.title)
        .bind(&changes.summary)
        .bind(&changes.description)
        .bind(changes.event_type.map(|t| t.as_str()))
        .bind(changes.start_time)
        .bind(changes.end_time)
        .bind(&changes.timezone)
        .bind(&changes.location)
        .bind(&changes.address)
        .bind(changes.is_online)
        .bind(&changes.online_url)
        .bind(changes.max_participants)
        .bind(changes.min_participants)
        .bind(changes.cost_per_person)
        .bind(changes.is_free)
        .bind(&changes.tags)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        let details_row = if let Some(input) = details {
            let row = sqlx::query_as::<_, DetailsRow>(&format!(
                r#"
                INSERT INTO event_details (event_id, sport_type, skill_level, equipment, rules,
                    format, duration_minutes, materials, intensity, age_group, custom_fields,
                    created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
                ON CONFLICT (event_id) DO UPDATE
                SET sport_type = COALESCE(EXCLUDED.sport_type, event_details.sport_type),
                    skill_level = COALESCE(EXCLUDED.skill_level, event_details.skill_level),
                    equipment = COALESCE(EXCLUDED.equipment, event_details.equipment),
                    rules = COALESCE(EXCLUDED.rules, event_details.rules),
                    format = COALESCE(EXCLUDED.format, event_details.format),
                    duration_minutes = COALESCE(EXCLUDED.duration_minutes, event_details.duration_minutes),
                    materials = COALESCE(EXCLUDED.materials, event_details.materials),
                    intensity = COALESCE(EXCLUDED.intensity, event_details.intensity),
                    age_group = COALESCE(EXCLUDED.age_group, event_details.age_group),
                    custom_fields = COALESCE(EXCLUDED.custom_fields, event_details.custom_fields),
                    updated_at = EXCLUDED.updated_at
                RETURNING {DETAILS_COLUMNS}
                "#
            ))
            .bind(event_id)
            .bind(&input.sport_type)
            .bind(&input.skill_level)
            .bind(&input.equipment)
            .bind(&input.rules)
            .bind(&input.format)
            .bind(input.duration_minutes)
            .bind(&input.materials)
            .bind(&input.intensity)
            .bind(&input.age_group)
            .bind(&input.custom_fields)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;
            Some(row)
        } else {
            sqlx::query_as::<_, DetailsRow>(&format!(
                "SELECT {DETAILS_COLUMNS} FROM event_details WHERE event_id = $1"
            ))
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await?
        };

        tx.commit().await?;

        Ok(Some(EventView {
            event: row.try_into()?,
            details: details_row.map(Into::into),
        }))
    }

    /// Compare-and-set status transition.
    ///
    /// The WHERE clause pins the expected current status, so a concurrent
    /// transition makes this a miss instead of a silent overwrite.
    /// published_at is write-once via COALESCE; archiving cascades the
    /// detail record inside the same transaction.
    pub async fn set_status(
        &self,
        event_id: Uuid,
        expected: EventStatus,
        next: EventStatus,
        published_at: Option<DateTime<Utc>>,
        reason: Option<String>,
    ) -> Result<StatusWrite> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            UPDATE events
            SET status = $3,
                published_at = COALESCE(published_at, $4),
                status_reason = $5,
                updated_at = $6
            WHERE id = $1 AND status = $2
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(expected.as_str())
        .bind(next.as_str())
        .bind(published_at)
        .bind(&reason)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(StatusWrite::Missed);
        };

        let details = if next == EventStatus::Archived {
            sqlx::query("DELETE FROM event_details WHERE event_id = $1")
                .bind(event_id)
                .execute(&mut *tx)
                .await?;
            None
        } else {
            sqlx::query_as::<_, DetailsRow>(&format!(
                "SELECT {DETAILS_COLUMNS} FROM event_details WHERE event_id = $1"
            ))
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await?
        };

        tx.commit().await?;

        Ok(StatusWrite::Applied(EventView {
            event: row.try_into()?,
            details: details.map(Into::into),
        }))
    }

    /// List events matching the filters, ordered by start_time, with the
    /// total match count for pagination
    pub async fn list(
        &self,
        filters: &EventFilters,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<EventView>, i64)> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE TRUE"
        ));
        push_filters(&mut query, filters);
        query.push(" ORDER BY start_time ASC LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let rows: Vec<EventRow> = query.build_query_as().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events WHERE TRUE");
        push_filters(&mut count, filters);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let detail_rows = sqlx::query_as::<_, DetailsRow>(&format!(
            "SELECT {DETAILS_COLUMNS} FROM event_details WHERE event_id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        let mut details: std::collections::HashMap<Uuid, EventDetails> = detail_rows
            .into_iter()
            .map(|row| (row.event_id, row.into()))
            .collect();

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let event: Event = row.try_into()?;
            let detail = details.remove(&event.id);
            events.push(EventView {
                event,
                details: detail,
            });
        }

        Ok((events, total))
    }

    /// Per-status counts, optionally scoped to one organizer
    pub async fn count_by_status(&self, organizer_id: Option<Uuid>) -> Result<EventStats> {
        let (total, published, draft, completed): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COUNT(*) FILTER (WHERE status = 'PUBLISHED'),
                   COUNT(*) FILTER (WHERE status = 'DRAFT'),
                   COUNT(*) FILTER (WHERE status = 'COMPLETED')
            FROM events
            WHERE $1::uuid IS NULL OR organizer_id = $1
            "#,
        )
        .bind(organizer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(EventStats {
            total_events: total,
            published_events: published,
            draft_events: draft,
            completed_events: completed,
        })
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &EventFilters) {
    if let Some(event_type) = filters.event_type {
        query.push(" AND event_type = ");
        query.push_bind(event_type.as_str());
    }
    if let Some(status) = filters.status {
        query.push(" AND status = ");
        query.push_bind(status.as_str());
    }
    if let Some(organizer_id) = filters.organizer_id {
        query.push(" AND organizer_id = ");
        query.push_bind(organizer_id);
    }
    if let Some(is_online) = filters.is_online {
        query.push(" AND is_online = ");
        query.push_bind(is_online);
    }
    if let Some(is_free) = filters.is_free {
        query.push(" AND is_free = ");
        query.push_bind(is_free);
    }
    if !filters.tags.is_empty() {
        query.push(" AND tags && ");
        query.push_bind(filters.tags.clone());
    }
    if let Some(after) = filters.starts_after {
        query.push(" AND start_time >= ");
        query.push_bind(after);
    }
    if let Some(before) = filters.starts_before {
        query.push(" AND start_time <= ");
        query.push_bind(before);
    }
}
