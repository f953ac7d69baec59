//! The one place where server payloads become canonical values.
//!
//! Servers have answered with snake_case and camelCase spellings, with ids as numbers,
//! strings or nested objects, and with status strings in mixed case. Everything past this
//! module only sees [`Game`], [`JoinRequest`], [`JoinRequestEntry`], [`PublicUser`] and
//! [`JoinStatus`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::str::FromStr;

use super::error::PlayError;
use crate::models::game::{Game, GameStatus, SkillLevel, Sport, Visibility};
use crate::models::join_request::{JoinRequest, JoinRequestEntry, JoinStatus, RequestStatus, UserJoinRequest};
use crate::models::user::PublicUser;

/// Conversion from a wire shape into its canonical model.
pub trait IntoCanonical {
    type Output;

    fn into_canonical(self) -> Result<Self::Output, PlayError>;
}

impl<W: IntoCanonical> IntoCanonical for Vec<W> {
    type Output = Vec<W::Output>;

    fn into_canonical(self) -> Result<Self::Output, PlayError> {
        self.into_iter().map(IntoCanonical::into_canonical).collect()
    }
}

/// Parses a JSON body and maps it in one step.
pub fn decode<W>(body: &str) -> Result<W::Output, PlayError>
where
    W: IntoCanonical + for<'de> Deserialize<'de>,
{
    serde_json::from_str::<W>(body)
        .map_err(|err| PlayError::Decode(err.to_string()))?
        .into_canonical()
}

fn parse<T: FromStr<Err = String>>(value: &str) -> Result<T, PlayError> {
    value.parse::<T>().map_err(PlayError::Decode)
}

#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum WireId {
    Number(i64),
    Text(String),
    Object { id: Box<WireId> },
}

impl WireId {
    pub fn value(&self) -> Result<u32, PlayError> {
        let id = match self {
            WireId::Number(n) => *n,
            WireId::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| PlayError::Decode(format!("id '{}' is not numeric", s)))?,
            WireId::Object { id } => return id.value(),
        };
        u32::try_from(id).map_err(|_| PlayError::Decode(format!("id {} is out of range", id)))
    }
}

/// Player counts. Anything below zero is clamped.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum WireCount {
    Number(i64),
    Text(String),
}

impl WireCount {
    pub fn value(&self) -> Result<u32, PlayError> {
        let count = match self {
            WireCount::Number(n) => *n,
            WireCount::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| PlayError::Decode(format!("count '{}' is not numeric", s)))?,
        };
        Ok(count.clamp(0, u32::MAX as i64) as u32)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct WireGame {
    pub id: WireId,
    pub sport: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(alias = "locationText")]
    pub location: String,
    #[serde(alias = "dateTime")]
    pub date_time: DateTime<Utc>,
    #[serde(alias = "currentPlayerCount", alias = "currentPlayersCount")]
    pub current_players_count: WireCount,
    #[serde(alias = "neededPlayerCount", alias = "neededPlayersCount")]
    pub needed_players_count: WireCount,
    #[serde(alias = "skillLevel")]
    pub skill_level: String,
    pub visibility: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(alias = "host", alias = "hostId")]
    pub host_id: WireId,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl IntoCanonical for WireGame {
    type Output = Game;

    fn into_canonical(self) -> Result<Game, PlayError> {
        let current_players_count = self.current_players_count.value()?;
        let needed_players_count = self.needed_players_count.value()?;
        let status = match self.status.as_deref() {
            Some(status) => parse::<GameStatus>(status)?,
            // Older payloads carry no status; derive it from the counts
            None if needed_players_count.saturating_sub(current_players_count) == 0 => GameStatus::Filled,
            None => GameStatus::Open,
        };
        let created_at = self.created_at.unwrap_or_default();

        Ok(Game {
            id: self.id.value()?,
            sport: parse::<Sport>(&self.sport)?,
            title: self.title,
            description: self.description,
            location: self.location,
            date_time: self.date_time,
            current_players_count,
            needed_players_count,
            skill_level: parse::<SkillLevel>(&self.skill_level)?,
            visibility: parse::<Visibility>(&self.visibility)?,
            status,
            host_id: self.host_id.value()?,
            created_at,
            updated_at: self.updated_at.unwrap_or(created_at),
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct WireJoinRequest {
    pub id: WireId,
    #[serde(alias = "game", alias = "gameId")]
    pub game_id: WireId,
    #[serde(alias = "user", alias = "userId", alias = "requesterId")]
    pub requester_id: WireId,
    pub status: String,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "decidedAt")]
    pub decided_at: Option<DateTime<Utc>>,
}

impl IntoCanonical for WireJoinRequest {
    type Output = JoinRequest;

    fn into_canonical(self) -> Result<JoinRequest, PlayError> {
        Ok(JoinRequest {
            id: self.id.value()?,
            game_id: self.game_id.value()?,
            requester_id: self.requester_id.value()?,
            status: parse::<RequestStatus>(&self.status)?,
            created_at: self.created_at.unwrap_or_default(),
            decided_at: self.decided_at,
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct WireJoinRequestEntry {
    pub id: WireId,
    #[serde(alias = "user", alias = "userId", alias = "requesterId")]
    pub requester_id: WireId,
    #[serde(alias = "user_name", alias = "userName", alias = "requesterDisplayName")]
    pub requester_display_name: String,
    #[serde(alias = "user_email", alias = "userEmail", alias = "requesterEmail")]
    pub requester_email: String,
    pub status: String,
}

impl IntoCanonical for WireJoinRequestEntry {
    type Output = JoinRequestEntry;

    fn into_canonical(self) -> Result<JoinRequestEntry, PlayError> {
        Ok(JoinRequestEntry {
            id: self.id.value()?,
            requester_id: self.requester_id.value()?,
            requester_display_name: self.requester_display_name,
            requester_email: self.requester_email,
            status: parse::<RequestStatus>(&self.status)?,
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct WireUserJoinRequest {
    pub id: WireId,
    pub status: String,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    pub game: WireGame,
}

impl IntoCanonical for WireUserJoinRequest {
    type Output = UserJoinRequest;

    fn into_canonical(self) -> Result<UserJoinRequest, PlayError> {
        Ok(UserJoinRequest {
            id: self.id.value()?,
            status: parse::<RequestStatus>(&self.status)?,
            created_at: self.created_at.unwrap_or_default(),
            game: self.game.into_canonical()?,
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct WireUser {
    pub id: WireId,
    #[serde(alias = "username")]
    pub name: String,
    #[serde(default, alias = "displayName")]
    pub display_name: Option<String>,
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: String,
}

impl IntoCanonical for WireUser {
    type Output = PublicUser;

    fn into_canonical(self) -> Result<PublicUser, PlayError> {
        let full_name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let display_name = match self.display_name.filter(|name| !name.trim().is_empty()) {
            Some(name) => name,
            None if !full_name.is_empty() => full_name,
            None => self.name.clone(),
        };

        Ok(PublicUser {
            id: self.id.value()?,
            name: self.name,
            display_name,
            email: self.email,
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct WireJoinStatus {
    pub status: String,
}

impl IntoCanonical for WireJoinStatus {
    type Output = JoinStatus;

    fn into_canonical(self) -> Result<JoinStatus, PlayError> {
        parse::<JoinStatus>(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAKE_GAME: &str = r#"{
        "id": 4, "sport": "football", "title": "Kickabout", "description": null,
        "location": "Park", "date_time": "2026-05-01T18:00:00Z",
        "current_players_count": 9, "needed_players_count": 10,
        "skill_level": "beginner", "visibility": "public", "status": "open",
        "host_id": 2, "created_at": "2026-04-01T09:00:00Z", "updated_at": "2026-04-02T09:00:00Z"
    }"#;

    const CAMEL_GAME: &str = r#"{
        "id": "4", "sport": "Football", "title": "Kickabout",
        "locationText": "Park", "dateTime": "2026-05-01T18:00:00Z",
        "currentPlayerCount": 9, "neededPlayerCount": 10,
        "skillLevel": "Beginner", "visibility": "Public", "status": "OPEN", "hostId": "2"
    }"#;

    #[test]
    fn test_snake_and_camel_games_normalize_alike() {
        let snake = decode::<WireGame>(SNAKE_GAME).unwrap();
        let camel = decode::<WireGame>(CAMEL_GAME).unwrap();

        for game in [&snake, &camel] {
            assert_eq!(game.id, 4);
            assert_eq!(game.sport, Sport::Football);
            assert_eq!(game.host_id, 2);
            assert_eq!(game.remaining_slots(), 1);
            assert_eq!(game.status, GameStatus::Open);
        }
    }

    #[test]
    fn test_negative_counts_are_clamped() {
        let body = SNAKE_GAME
            .replace(r#""current_players_count": 9"#, r#""current_players_count": -3"#)
            .replace(r#""needed_players_count": 10"#, r#""needed_players_count": -1"#);
        let game = decode::<WireGame>(&body).unwrap();
        assert_eq!(game.current_players_count, 0);
        assert_eq!(game.needed_players_count, 0);
        assert_eq!(game.remaining_slots(), 0);
    }

    #[test]
    fn test_missing_status_is_derived_from_counts() {
        let open = SNAKE_GAME.replace(r#""status": "open","#, "");
        assert_eq!(decode::<WireGame>(&open).unwrap().status, GameStatus::Open);

        let full = open.replace(r#""current_players_count": 9"#, r#""current_players_count": 10"#);
        assert_eq!(decode::<WireGame>(&full).unwrap().status, GameStatus::Filled);
    }

    #[test]
    fn test_nested_host_object() {
        let body = SNAKE_GAME.replace(r#""host_id": 2"#, r#""host": {"id": 2, "username": "kim"}"#);
        assert_eq!(decode::<WireGame>(&body).unwrap().host_id, 2);
    }

    #[test]
    fn test_unknown_sport_is_a_decode_error() {
        let body = SNAKE_GAME.replace(r#""sport": "football""#, r#""sport": "golf""#);
        assert!(matches!(decode::<WireGame>(&body), Err(PlayError::Decode(_))));
    }

    #[test]
    fn test_join_status_spellings() {
        for (body, expected) in [
            (r#"{"status":"Not requested"}"#, JoinStatus::NotRequested),
            (r#"{"status":"not_requested"}"#, JoinStatus::NotRequested),
            (r#"{"status":"Requested"}"#, JoinStatus::Requested),
            (r#"{"status":"accepted"}"#, JoinStatus::Accepted),
            (r#"{"status":"Rejected"}"#, JoinStatus::Rejected),
        ] {
            assert_eq!(decode::<WireJoinStatus>(body).unwrap(), expected, "{}", body);
        }
        assert!(decode::<WireJoinStatus>(r#"{"status":"maybe"}"#).is_err());
    }

    #[test]
    fn test_legacy_join_request_entries() {
        let body = r#"[
            {"id": 1, "user": 5, "user_name": "kim", "user_email": "kim@example.com", "status": "requested"},
            {"id": 2, "requester_id": "6", "requester_display_name": "Lee", "requester_email": "lee@example.com", "status": "Accepted"}
        ]"#;
        let entries = decode::<Vec<WireJoinRequestEntry>>(body).unwrap();
        assert_eq!(entries[0].requester_id, 5);
        assert_eq!(entries[0].requester_display_name, "kim");
        assert_eq!(entries[0].status, RequestStatus::Requested);
        assert_eq!(entries[1].requester_id, 6);
        assert_eq!(entries[1].status, RequestStatus::Accepted);
    }

    #[test]
    fn test_user_display_name_fallbacks() {
        let plain = decode::<WireUser>(r#"{"id": 3, "name": "kim", "display_name": "Kim", "email": "k@x.io"}"#).unwrap();
        assert_eq!(plain.display_name, "Kim");

        let legacy = decode::<WireUser>(r#"{"id": "3", "username": "kim", "first_name": "Kim", "last_name": "Park", "email": "k@x.io"}"#).unwrap();
        assert_eq!(legacy.name, "kim");
        assert_eq!(legacy.display_name, "Kim Park");

        let bare = decode::<WireUser>(r#"{"id": 3, "username": "kim"}"#).unwrap();
        assert_eq!(bare.display_name, "kim");
    }

    #[test]
    fn test_ids_out_of_range() {
        assert!(WireId::Number(-1).value().is_err());
        assert!(WireId::Text("abc".to_string()).value().is_err());
        assert_eq!(WireId::Text(" 42 ".to_string()).value().unwrap(), 42);
    }
}
