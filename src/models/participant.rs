//! Participant model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Registration status of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantStatus {
    Registered,
    Confirmed,
    Cancelled,
    Waitlisted,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Registered => "REGISTERED",
            ParticipantStatus::Confirmed => "CONFIRMED",
            ParticipantStatus::Cancelled => "CANCELLED",
            ParticipantStatus::Waitlisted => "WAITLISTED",
        }
    }

    /// Only REGISTERED and CONFIRMED occupy a capacity slot
    pub fn counts_toward_capacity(self) -> bool {
        matches!(
            self,
            ParticipantStatus::Registered | ParticipantStatus::Confirmed
        )
    }
}

impl std::fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipantStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "REGISTERED" => Ok(ParticipantStatus::Registered),
            "CONFIRMED" => Ok(ParticipantStatus::Confirmed),
            "CANCELLED" => Ok(ParticipantStatus::Cancelled),
            "WAITLISTED" => Ok(ParticipantStatus::Waitlisted),
            other => Err(format!("unknown participant status: {other}")),
        }
    }
}

/// A user's registration record against one event.
///
/// Never physically deleted: withdrawal flips the status to CANCELLED, which
/// frees the capacity slot but keeps the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: ParticipantStatus,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    /// Fresh REGISTERED record for an admission
    pub fn new(event_id: Uuid, user_id: Uuid, joined_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            status: ParticipantStatus::Registered,
            joined_at,
        }
    }
}
