use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use super::Store;
use crate::errors::CustomError;
use crate::models::game::{Game, GameFilter, NewGame};
use crate::models::join_request::{Decision, JoinRequest, JoinRequestEntry, RequestStatus, UserJoinRequest};
use crate::models::user::{GameStats, SignUp, User};

// In-process store used for development and tests. One lock serializes every mutation.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<u32, User>,
    games: BTreeMap<u32, Game>,
    join_requests: BTreeMap<u32, JoinRequest>,
    last_id: u32,
}

impl Tables {
    fn next_id(&mut self) -> u32 {
        self.last_id += 1;
        self.last_id
    }

    fn game(&self, id: u32) -> Result<&Game, CustomError> {
        self.games.get(&id).ok_or(CustomError::GameNotFound)
    }
}

// Listings are ordered by kick-off, ties by id
fn by_date(mut games: Vec<Game>) -> Vec<Game> {
    games.sort_by_key(|g| g.date_time);
    games
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, signup: &SignUp, password_hash: &str) -> Result<User, CustomError> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|user| user.name == signup.name) {
            return Err(CustomError::UserExists);
        }
        let user = User {
            id: tables.next_id(),
            name: signup.name.clone(),
            password_hash: password_hash.to_string(),
            display_name: signup.display_name.clone(),
            email: signup.email.clone(),
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user_by_name(&self, name: &str) -> Result<User, CustomError> {
        let tables = self.tables.lock().await;
        tables
            .users
            .values()
            .find(|user| user.name == name)
            .cloned()
            .ok_or(CustomError::UserNotFound)
    }

    async fn user_by_id(&self, id: u32) -> Result<User, CustomError> {
        let tables = self.tables.lock().await;
        tables.users.get(&id).cloned().ok_or(CustomError::UserNotFound)
    }

    async fn game_stats(&self, user_id: u32) -> Result<GameStats, CustomError> {
        let tables = self.tables.lock().await;
        if !tables.users.contains_key(&user_id) {
            return Err(CustomError::UserNotFound);
        }
        let games_hosted = tables.games.values().filter(|g| g.host_id == user_id).count();
        let games_joined = tables
            .join_requests
            .values()
            .filter(|r| r.requester_id == user_id && r.status == RequestStatus::Accepted)
            .count();
        Ok(GameStats {
            games_hosted: games_hosted as u32,
            games_joined: games_joined as u32,
        })
    }

    async fn create_game(&self, host_id: u32, new_game: NewGame) -> Result<Game, CustomError> {
        let mut tables = self.tables.lock().await;
        let id = tables.next_id();
        let game = new_game.into_game(id, host_id, Utc::now());
        tables.games.insert(id, game.clone());
        Ok(game)
    }

    async fn game(&self, id: u32) -> Result<Game, CustomError> {
        let tables = self.tables.lock().await;
        tables.game(id).cloned()
    }

    async fn list_games(&self, filter: &GameFilter, viewer: Option<u32>) -> Result<Vec<Game>, CustomError> {
        let tables = self.tables.lock().await;
        let games = tables
            .games
            .values()
            .filter(|g| g.is_visible_to(None) && Some(g.host_id) != viewer && g.matches(filter))
            .cloned()
            .collect();
        Ok(by_date(games))
    }

    async fn hosted_games(&self, host_id: u32) -> Result<Vec<Game>, CustomError> {
        let tables = self.tables.lock().await;
        let games = tables.games.values().filter(|g| g.host_id == host_id).cloned().collect();
        Ok(by_date(games))
    }

    async fn cancel_game(&self, game_id: u32, host_id: u32) -> Result<Game, CustomError> {
        let mut tables = self.tables.lock().await;
        let game = tables.games.get_mut(&game_id).ok_or(CustomError::GameNotFound)?;
        if !game.is_visible_to(Some(host_id)) {
            return Err(CustomError::GameNotFound);
        }
        if game.host_id != host_id {
            return Err(CustomError::NotHost);
        }
        game.cancel()?;
        game.updated_at = Utc::now();
        Ok(game.clone())
    }

    async fn join_request_for(&self, game_id: u32, requester_id: u32) -> Result<Option<JoinRequest>, CustomError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .join_requests
            .values()
            .rev()
            .find(|r| r.game_id == game_id && r.requester_id == requester_id)
            .cloned())
    }

    async fn submit_join_request(&self, game_id: u32, requester_id: u32) -> Result<JoinRequest, CustomError> {
        let mut tables = self.tables.lock().await;
        let game = tables.game(game_id)?;
        if !game.is_visible_to(Some(requester_id)) {
            return Err(CustomError::GameNotFound);
        }
        game.check_joinable_by(requester_id)?;
        if tables
            .join_requests
            .values()
            .any(|r| r.game_id == game_id && r.requester_id == requester_id)
        {
            return Err(CustomError::AlreadyRequested);
        }
        let request = JoinRequest::new(tables.next_id(), game_id, requester_id, Utc::now());
        tables.join_requests.insert(request.id, request.clone());
        debug!("join request {} filed for game {}", request.id, game_id);
        Ok(request)
    }

    async fn join_requests_for_game(&self, game_id: u32, host_id: u32) -> Result<Vec<JoinRequestEntry>, CustomError> {
        let tables = self.tables.lock().await;
        let game = tables.game(game_id)?;
        if !game.is_visible_to(Some(host_id)) {
            return Err(CustomError::GameNotFound);
        }
        if game.host_id != host_id {
            return Err(CustomError::NotHost);
        }
        tables
            .join_requests
            .values()
            .filter(|r| r.game_id == game_id)
            .map(|r| {
                let requester = tables.users.get(&r.requester_id).ok_or(CustomError::InternalServerError)?;
                Ok(JoinRequestEntry {
                    id: r.id,
                    requester_id: r.requester_id,
                    requester_display_name: requester.display_name.clone(),
                    requester_email: requester.email.clone(),
                    status: r.status,
                })
            })
            .collect()
    }

    async fn decide_join_request(&self, request_id: u32, host_id: u32, decision: Decision) -> Result<JoinRequest, CustomError> {
        let mut tables = self.tables.lock().await;
        let mut request = tables
            .join_requests
            .get(&request_id)
            .cloned()
            .ok_or(CustomError::JoinRequestNotFound)?;
        let mut game = tables.game(request.game_id)?.clone();

        request.apply_decision(&mut game, host_id, decision, Utc::now())?;

        tables.games.insert(game.id, game);
        tables.join_requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn join_requests_by_user(&self, user_id: u32) -> Result<Vec<UserJoinRequest>, CustomError> {
        let tables = self.tables.lock().await;
        tables
            .join_requests
            .values()
            .rev()
            .filter(|r| r.requester_id == user_id)
            .map(|r| {
                Ok(UserJoinRequest {
                    id: r.id,
                    status: r.status,
                    created_at: r.created_at,
                    game: tables.game(r.game_id)?.clone(),
                })
            })
            .collect()
    }
}
