use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::errors::CustomError;
use crate::models::game::Game;

#[derive(Deserialize, Serialize, sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct JoinRequest {
    pub id: u32,
    pub game_id: u32,
    pub requester_id: u32,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

// Persisted status of a request. A missing record is JoinStatus::NotRequested.
#[derive(Deserialize, Serialize, sqlx::Type, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Requested,
    Accepted,
    Rejected,
}

// Status of a (game, requester) pair as seen by the requester
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JoinStatus {
    NotRequested,
    Requested,
    Accepted,
    Rejected,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Requested => false,
            Self::Accepted | Self::Rejected => true,
        }
    }

    /// The only transitions are requested -> accepted and requested -> rejected.
    pub fn decide(self, decision: Decision) -> Result<RequestStatus, CustomError> {
        match (self, decision) {
            (Self::Requested, Decision::Accepted) => Ok(Self::Accepted),
            (Self::Requested, Decision::Rejected) => Ok(Self::Rejected),
            (Self::Accepted | Self::Rejected, _) => Err(CustomError::AlreadyDecided),
        }
    }
}

impl JoinRequest {
    pub fn new(id: u32, game_id: u32, requester_id: u32, now: DateTime<Utc>) -> Self {
        JoinRequest {
            id,
            game_id,
            requester_id,
            status: RequestStatus::Requested,
            created_at: now,
            decided_at: None,
        }
    }

    /// Applies a host decision to the request and, on acceptance, to the game roster.
    /// Nothing is modified when an error is returned.
    pub fn apply_decision(
        &mut self,
        game: &mut Game,
        host_id: u32,
        decision: Decision,
        now: DateTime<Utc>,
    ) -> Result<(), CustomError> {
        if game.id != self.game_id {
            return Err(CustomError::InternalServerError);
        }
        if game.host_id != host_id {
            return Err(CustomError::NotHost);
        }
        let next = self.status.decide(decision)?;
        if next == RequestStatus::Accepted {
            game.admit_player()?;
            game.updated_at = now;
        }
        self.status = next;
        self.decided_at = Some(now);
        Ok(())
    }
}

impl From<Option<RequestStatus>> for JoinStatus {
    fn from(status: Option<RequestStatus>) -> Self {
        match status {
            None => JoinStatus::NotRequested,
            Some(RequestStatus::Requested) => JoinStatus::Requested,
            Some(RequestStatus::Accepted) => JoinStatus::Accepted,
            Some(RequestStatus::Rejected) => JoinStatus::Rejected,
        }
    }
}

impl From<RequestStatus> for JoinStatus {
    fn from(status: RequestStatus) -> Self {
        Some(status).into()
    }
}

impl JoinStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotRequested => "not_requested",
            Self::Requested => "requested",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for JoinStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Folds the spellings seen on the wire ("Not requested", "not_requested", "NotRequested")
/// onto one key.
fn status_key(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for JoinStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match status_key(s).as_str() {
            "notrequested" => Ok(Self::NotRequested),
            "requested" => Ok(Self::Requested),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("unknown join status '{}'", s)),
        }
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<JoinStatus>()? {
            JoinStatus::Requested => Ok(Self::Requested),
            JoinStatus::Accepted => Ok(Self::Accepted),
            JoinStatus::Rejected => Ok(Self::Rejected),
            JoinStatus::NotRequested => Err("not_requested is never stored on a request".to_string()),
        }
    }
}

impl FromStr for Decision {
    type Err = CustomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match status_key(s).as_str() {
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(CustomError::InvalidDecision),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        })
    }
}

// The struct used for receiving a host decision as json
#[derive(Deserialize, Serialize, Debug)]
pub struct DecisionRequest {
    pub status: String,
}

// The struct used to respond with a join status as json
#[derive(Deserialize, Serialize, Debug)]
pub struct JoinStatusResponse {
    pub status: JoinStatus,
}

// One row of the host's request list
#[derive(Deserialize, Serialize, sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct JoinRequestEntry {
    pub id: u32,
    pub requester_id: u32,
    pub requester_display_name: String,
    pub requester_email: String,
    pub status: RequestStatus,
}

// One row of the requester's own request list
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct UserJoinRequest {
    pub id: u32,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub game: Game,
}
