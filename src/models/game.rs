use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::errors::CustomError;

#[derive(Deserialize, Serialize, sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct Game {
    pub id: u32,
    pub sport: Sport,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub date_time: DateTime<Utc>,
    pub current_players_count: u32,
    pub needed_players_count: u32,
    pub skill_level: SkillLevel,
    pub visibility: Visibility,
    pub status: GameStatus,
    pub host_id: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, sqlx::Type, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum GameStatus {
    Open,
    Filled,
    Cancelled,
}

#[derive(Deserialize, Serialize, sqlx::Type, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Sport {
    Football,
    Basketball,
    Cricket,
    Futsal,
}

#[derive(Deserialize, Serialize, sqlx::Type, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Deserialize, Serialize, sqlx::Type, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Game {
    /// Open slots left on the roster. Malformed counts (current above needed) floor at zero.
    pub fn remaining_slots(&self) -> u32 {
        self.needed_players_count.saturating_sub(self.current_players_count)
    }

    pub fn can_accept_join_request(&self) -> bool {
        self.status == GameStatus::Open && self.remaining_slots() > 0
    }

    /// Checks that a new request may be filed against this game by `requester_id`.
    pub fn check_joinable_by(&self, requester_id: u32) -> Result<(), CustomError> {
        if self.host_id == requester_id {
            return Err(CustomError::HostCannotJoin);
        }
        self.check_accepting()
    }

    fn check_accepting(&self) -> Result<(), CustomError> {
        match self.status {
            GameStatus::Cancelled | GameStatus::Filled => Err(CustomError::GameNotOpen),
            GameStatus::Open if self.remaining_slots() == 0 => Err(CustomError::GameFull),
            GameStatus::Open => Ok(()),
        }
    }

    /// Occupies one slot. Flips the game to `filled` once the last slot is taken.
    pub fn admit_player(&mut self) -> Result<(), CustomError> {
        self.check_accepting()?;
        self.current_players_count += 1;
        if self.remaining_slots() == 0 {
            self.status = GameStatus::Filled;
        }
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), CustomError> {
        match self.status {
            GameStatus::Cancelled => Err(CustomError::AlreadyCancelled),
            GameStatus::Open | GameStatus::Filled => {
                self.status = GameStatus::Cancelled;
                Ok(())
            }
        }
    }

    pub fn is_visible_to(&self, viewer: Option<u32>) -> bool {
        self.visibility == Visibility::Public || viewer == Some(self.host_id)
    }

    pub fn matches(&self, filter: &GameFilter) -> bool {
        if filter.sport.map_or(false, |sport| sport != self.sport) {
            return false;
        }
        if filter.skill_level.map_or(false, |level| level != self.skill_level) {
            return false;
        }
        match filter.search_term() {
            Some(term) => [Some(&self.title), Some(&self.location), self.description.as_ref()]
                .into_iter()
                .flatten()
                .any(|text| text.to_lowercase().contains(&term)),
            None => true,
        }
    }
}

// The struct used for a new game
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NewGame {
    pub sport: Sport,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub date_time: DateTime<Utc>,
    pub current_players_count: u32,
    pub needed_players_count: u32,
    pub skill_level: SkillLevel,
    pub visibility: Visibility,
}

impl NewGame {
    pub fn validate(&self) -> Result<(), CustomError> {
        if self.title.trim().is_empty() || self.location.trim().is_empty() {
            return Err(CustomError::MissingGameFields);
        }
        if self.current_players_count < 1
            || self.needed_players_count < 1
            || self.current_players_count > self.needed_players_count
        {
            return Err(CustomError::InvalidPlayerCounts);
        }
        Ok(())
    }

    /// Status a freshly created game starts in.
    pub fn initial_status(&self) -> GameStatus {
        if self.current_players_count >= self.needed_players_count {
            GameStatus::Filled
        } else {
            GameStatus::Open
        }
    }

    pub fn into_game(self, id: u32, host_id: u32, now: DateTime<Utc>) -> Game {
        let status = self.initial_status();
        Game {
            id,
            sport: self.sport,
            title: self.title,
            description: self.description,
            location: self.location,
            date_time: self.date_time,
            current_players_count: self.current_players_count,
            needed_players_count: self.needed_players_count,
            skill_level: self.skill_level,
            visibility: self.visibility,
            status,
            host_id,
            created_at: now,
            updated_at: now,
        }
    }
}

// Query parameters for browsing games
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct GameFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport: Option<Sport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_level: Option<SkillLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl GameFilter {
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

macro_rules! lowercase_names {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($name => Ok(Self::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($ty), other)),
                }
            }
        }
    };
}

lowercase_names!(GameStatus { Open => "open", Filled => "filled", Cancelled => "cancelled" });
lowercase_names!(Sport {
    Football => "football",
    Basketball => "basketball",
    Cricket => "cricket",
    Futsal => "futsal",
});
lowercase_names!(SkillLevel {
    Beginner => "beginner",
    Intermediate => "intermediate",
    Advanced => "advanced",
});
lowercase_names!(Visibility { Public => "public", Private => "private" });

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_new_game() -> NewGame {
        NewGame {
            sport: Sport::Football,
            title: "Sunday five-a-side".to_string(),
            description: Some("Bring bibs".to_string()),
            location: "Riverside Park".to_string(),
            date_time: Utc::now(),
            current_players_count: 1,
            needed_players_count: 10,
            skill_level: SkillLevel::Intermediate,
            visibility: Visibility::Public,
        }
    }

    fn game_with(current: u32, needed: u32, status: GameStatus) -> Game {
        let mut game = sample_new_game().into_game(1, 7, Utc::now());
        game.current_players_count = current;
        game.needed_players_count = needed;
        game.status = status;
        game
    }

    #[test]
    fn test_remaining_slots_never_negative() {
        assert_eq!(game_with(3, 10, GameStatus::Open).remaining_slots(), 7);
        assert_eq!(game_with(10, 10, GameStatus::Filled).remaining_slots(), 0);
        assert_eq!(game_with(12, 10, GameStatus::Open).remaining_slots(), 0);
        assert_eq!(game_with(0, 0, GameStatus::Open).remaining_slots(), 0);
    }

    #[test]
    fn test_can_accept_requires_open_status() {
        assert!(game_with(3, 10, GameStatus::Open).can_accept_join_request());
        assert!(!game_with(3, 10, GameStatus::Filled).can_accept_join_request());
        assert!(!game_with(3, 10, GameStatus::Cancelled).can_accept_join_request());
        assert!(!game_with(10, 10, GameStatus::Open).can_accept_join_request());
    }

    #[test]
    fn test_admit_last_player_fills_game() {
        let mut game = game_with(9, 10, GameStatus::Open);
        game.admit_player().unwrap();
        assert_eq!(game.current_players_count, 10);
        assert_eq!(game.status, GameStatus::Filled);
        assert_eq!(game.remaining_slots(), 0);
        assert_eq!(game.admit_player(), Err(CustomError::GameNotOpen));
    }

    #[test]
    fn test_admit_keeps_game_open_with_slots_left() {
        let mut game = game_with(2, 10, GameStatus::Open);
        game.admit_player().unwrap();
        assert_eq!(game.current_players_count, 3);
        assert_eq!(game.status, GameStatus::Open);
    }

    #[test]
    fn test_admit_rejects_open_game_without_slots() {
        let mut game = game_with(10, 10, GameStatus::Open);
        assert_eq!(game.admit_player(), Err(CustomError::GameFull));
        assert_eq!(game.current_players_count, 10);
    }

    #[test]
    fn test_host_cannot_join_own_game() {
        let game = game_with(1, 10, GameStatus::Open);
        assert_eq!(game.check_joinable_by(7), Err(CustomError::HostCannotJoin));
        assert_eq!(game.check_joinable_by(8), Ok(()));
    }

    #[test]
    fn test_cancelled_game_is_never_joinable() {
        let mut game = game_with(1, 10, GameStatus::Open);
        game.cancel().unwrap();
        assert_eq!(game.check_joinable_by(8), Err(CustomError::GameNotOpen));
        assert_eq!(game.cancel(), Err(CustomError::AlreadyCancelled));
    }

    #[test]
    fn test_new_game_validation() {
        assert!(sample_new_game().validate().is_ok());

        let mut missing_title = sample_new_game();
        missing_title.title = "  ".to_string();
        assert_eq!(missing_title.validate(), Err(CustomError::MissingGameFields));

        let mut zero_needed = sample_new_game();
        zero_needed.needed_players_count = 0;
        assert_eq!(zero_needed.validate(), Err(CustomError::InvalidPlayerCounts));

        let mut too_many = sample_new_game();
        too_many.current_players_count = 11;
        assert_eq!(too_many.validate(), Err(CustomError::InvalidPlayerCounts));
    }

    #[test]
    fn test_full_game_starts_filled() {
        let mut full = sample_new_game();
        full.current_players_count = 10;
        assert_eq!(full.initial_status(), GameStatus::Filled);
        assert_eq!(sample_new_game().initial_status(), GameStatus::Open);
    }

    #[test]
    fn test_private_game_only_visible_to_host() {
        let mut game = game_with(1, 10, GameStatus::Open);
        game.visibility = Visibility::Private;
        assert!(game.is_visible_to(Some(7)));
        assert!(!game.is_visible_to(Some(8)));
        assert!(!game.is_visible_to(None));
    }

    #[test]
    fn test_filter_matching() {
        let game = game_with(1, 10, GameStatus::Open);
        assert!(game.matches(&GameFilter::default()));
        assert!(game.matches(&GameFilter { search: Some("riverside".into()), ..Default::default() }));
        assert!(game.matches(&GameFilter { search: Some("BIBS".into()), ..Default::default() }));
        assert!(!game.matches(&GameFilter { sport: Some(Sport::Cricket), ..Default::default() }));
        assert!(!game.matches(&GameFilter { skill_level: Some(SkillLevel::Advanced), ..Default::default() }));
    }

    #[test]
    fn test_enum_names_parse_case_insensitively() {
        assert_eq!("Filled".parse::<GameStatus>(), Ok(GameStatus::Filled));
        assert_eq!(" futsal ".parse::<Sport>(), Ok(Sport::Futsal));
        assert!("golf".parse::<Sport>().is_err());
        assert_eq!(serde_json::to_string(&Visibility::Private).unwrap(), "\"private\"");
    }
}
