//! Registration service
//!
//! Admits participants into events without ever exceeding max_participants.
//! The admission check and insert happen inside one atomic storage unit, so
//! any interleaving of concurrent joins against the same event behaves like
//! some serial order of them.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::store::{AdmitOutcome, EventStore};
use crate::models::participant::{Participant, ParticipantStatus};
use crate::utils::errors::{PlayOnError, Result};

/// Service owning participant admission under the capacity invariant
#[derive(Clone)]
pub struct RegistrationEngine {
    store: Arc<dyn EventStore>,
}

impl RegistrationEngine {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Register a user for an event.
    ///
    /// Fails with EventNotFound, EventNotJoinable (status gating),
    /// AlreadyRegistered, or EventFull. A capacity race lost at commit time
    /// surfaces as EventFull; the participant is never partially admitted.
    /// None of these are retried here, and blindly retrying EventFull or
    /// AlreadyRegistered is never correct for callers either.
    pub async fn join_event(&self, event_id: Uuid, user_id: Uuid) -> Result<Participant> {
        match self
            .store
            .admit_participant(event_id, user_id, Utc::now())
            .await?
        {
            AdmitOutcome::Admitted(participant) => {
                info!(event_id = %event_id, user_id = %user_id, participant_id = %participant.id, "Participant registered");
                Ok(participant)
            }
            AdmitOutcome::NotFound => Err(PlayOnError::EventNotFound { event_id }),
            AdmitOutcome::NotJoinable(status) => {
                debug!(event_id = %event_id, status = %status, "Join rejected, event not joinable");
                Err(PlayOnError::EventNotJoinable { event_id, status })
            }
            AdmitOutcome::AlreadyRegistered => {
                debug!(event_id = %event_id, user_id = %user_id, "Join rejected, already registered");
                Err(PlayOnError::AlreadyRegistered { event_id, user_id })
            }
            AdmitOutcome::Full => {
                warn!(event_id = %event_id, user_id = %user_id, "Join rejected, event full");
                Err(PlayOnError::EventFull { event_id })
            }
        }
    }

    /// Withdraw a user's active registration.
    ///
    /// The record flips to CANCELLED and stays on file; the capacity slot is
    /// freed, so the user may register again later.
    pub async fn leave_event(&self, event_id: Uuid, user_id: Uuid) -> Result<Participant> {
        let participant = self
            .store
            .update_active_participant_status(event_id, user_id, ParticipantStatus::Cancelled)
            .await?
            .ok_or(PlayOnError::NotRegistered { event_id, user_id })?;

        info!(event_id = %event_id, user_id = %user_id, "Participant withdrew");
        Ok(participant)
    }

    /// Confirm a registered participant's attendance.
    ///
    /// CONFIRMED still occupies the capacity slot; this is bookkeeping, not
    /// admission.
    pub async fn confirm_participant(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Participant> {
        let participant = self
            .store
            .update_active_participant_status(event_id, user_id, ParticipantStatus::Confirmed)
            .await?
            .ok_or(PlayOnError::NotRegistered { event_id, user_id })?;

        info!(event_id = %event_id, user_id = %user_id, "Participant confirmed");
        Ok(participant)
    }

    /// Number of participants currently holding a capacity slot
    pub async fn active_count(&self, event_id: Uuid) -> Result<i64> {
        self.store.count_active_participants(event_id).await
    }

    /// Whether a user holds an active registration for an event
    pub async fn is_registered(&self, event_id: Uuid, user_id: Uuid) -> Result<bool> {
        Ok(self
            .store
            .find_active_participant(event_id, user_id)
            .await?
            .is_some())
    }
}
