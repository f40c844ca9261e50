//! Participant repository implementation
//!
//! Admission is the one contended write path in the system: the capacity
//! check and the insert run in a single transaction that locks the event
//! row, so concurrent joins against the same event serialize and the count
//! can never overshoot max_participants.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::database::store::AdmitOutcome;
use crate::models::event::EventStatus;
use crate::models::participant::{Participant, ParticipantStatus};
use crate::utils::errors::{PlayOnError, Result};

const PARTICIPANT_COLUMNS: &str = "id, event_id, user_id, status, joined_at";

// Partial unique index from the initial migration; backstops duplicate
// admissions that slip past the in-transaction check.
const ACTIVE_UNIQUE_INDEX: &str = "uniq_active_participant";

#[derive(FromRow)]
struct ParticipantRow {
    id: Uuid,
    event_id: Uuid,
    user_id: Uuid,
    status: String,
    joined_at: DateTime<Utc>,
}

impl TryFrom<ParticipantRow> for Participant {
    type Error = PlayOnError;

    fn try_from(row: ParticipantRow) -> Result<Participant> {
        Ok(Participant {
            id: row.id,
            event_id: row.event_id,
            user_id: row.user_id,
            status: row.status.parse().map_err(PlayOnError::Corrupt)?,
            joined_at: row.joined_at,
        })
    }
}

#[derive(Clone)]
pub struct ParticipantRepository {
    pool: PgPool,
}

impl ParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Admit a user into an event under the capacity invariant.
    ///
    /// Locks the event row for the duration of the transaction, re-checks
    /// status and active count behind the lock, and only then inserts. A
    /// lost race therefore commits at most max_participants admissions.
    pub async fn admit(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        joined_at: DateTime<Utc>,
    ) -> Result<AdmitOutcome> {
        let mut tx = self.pool.begin().await?;

        let event: Option<(String, i32)> = sqlx::query_as(
            "SELECT status, max_participants FROM events WHERE id = $1 FOR UPDATE",
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((status, max_participants)) = event else {
            return Ok(AdmitOutcome::NotFound);
        };
        let status: EventStatus = status.parse().map_err(PlayOnError::Corrupt)?;
        if status != EventStatus::Published {
            return Ok(AdmitOutcome::NotJoinable(status));
        }

        let already: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM participants
                WHERE event_id = $1 AND user_id = $2
                  AND status IN ('REGISTERED', 'CONFIRMED')
            )
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        if already {
            return Ok(AdmitOutcome::AlreadyRegistered);
        }

        let active: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM participants
            WHERE event_id = $1 AND status IN ('REGISTERED', 'CONFIRMED')
            "#,
        )
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await?;
        if active >= max_participants as i64 {
            return Ok(AdmitOutcome::Full);
        }

        let participant = Participant::new(event_id, user_id, joined_at);
        let inserted = sqlx::query(
            r#"
            INSERT INTO participants (id, event_id, user_id, status, joined_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(participant.id)
        .bind(participant.event_id)
        .bind(participant.user_id)
        .bind(participant.status.as_str())
        .bind(participant.joined_at)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db))
                if db.constraint() == Some(ACTIVE_UNIQUE_INDEX) =>
            {
                return Ok(AdmitOutcome::AlreadyRegistered);
            }
            Err(err) => return Err(err.into()),
        }

        tx.commit().await?;
        Ok(AdmitOutcome::Admitted(participant))
    }

    /// Find a user's active (capacity-holding) record for an event
    pub async fn find_active(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Participant>> {
        let row = sqlx::query_as::<_, ParticipantRow>(&format!(
            r#"
            SELECT {PARTICIPANT_COLUMNS} FROM participants
            WHERE event_id = $1 AND user_id = $2
              AND status IN ('REGISTERED', 'CONFIRMED')
            "#
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Count participants currently holding a capacity slot
    pub async fn count_active(&self, event_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM participants
            WHERE event_id = $1 AND status IN ('REGISTERED', 'CONFIRMED')
            "#,
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Move a user's active record to a new status (withdraw, confirm)
    pub async fn update_active_status(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        next: ParticipantStatus,
    ) -> Result<Option<Participant>> {
        let row = sqlx::query_as::<_, ParticipantRow>(&format!(
            r#"
            UPDATE participants
            SET status = $3
            WHERE event_id = $1 AND user_id = $2
              AND status IN ('REGISTERED', 'CONFIRMED')
            RETURNING {PARTICIPANT_COLUMNS}
            "#
        ))
        .bind(event_id)
        .bind(user_id)
        .bind(next.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Full roster for an event, oldest registration first
    pub async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<Participant>> {
        let rows = sqlx::query_as::<_, ParticipantRow>(&format!(
            "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE event_id = $1 ORDER BY joined_at ASC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
