//! Persistence behind the handlers.
//!
//! Every operation that touches the join-request state machine is a single atomic call so
//! that racing submissions or decisions are resolved here and never in a handler.

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::CustomError;
use crate::models::game::{Game, GameFilter, NewGame};
use crate::models::join_request::{Decision, JoinRequest, JoinRequestEntry, UserJoinRequest};
use crate::models::user::{GameStats, SignUp, User};

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

pub type DynStore = Arc<dyn Store>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Inserts a user. `UserExists` when the name is taken.
    async fn create_user(&self, signup: &SignUp, password_hash: &str) -> Result<User, CustomError>;
    async fn user_by_name(&self, name: &str) -> Result<User, CustomError>;
    async fn user_by_id(&self, id: u32) -> Result<User, CustomError>;
    async fn game_stats(&self, user_id: u32) -> Result<GameStats, CustomError>;

    async fn create_game(&self, host_id: u32, new_game: NewGame) -> Result<Game, CustomError>;
    async fn game(&self, id: u32) -> Result<Game, CustomError>;
    /// Public games matching `filter`, leaving out the viewer's own games.
    async fn list_games(&self, filter: &GameFilter, viewer: Option<u32>) -> Result<Vec<Game>, CustomError>;
    async fn hosted_games(&self, host_id: u32) -> Result<Vec<Game>, CustomError>;
    async fn cancel_game(&self, game_id: u32, host_id: u32) -> Result<Game, CustomError>;

    /// Latest request of `requester_id` for the game, if any.
    async fn join_request_for(&self, game_id: u32, requester_id: u32) -> Result<Option<JoinRequest>, CustomError>;
    async fn submit_join_request(&self, game_id: u32, requester_id: u32) -> Result<JoinRequest, CustomError>;
    async fn join_requests_for_game(&self, game_id: u32, host_id: u32) -> Result<Vec<JoinRequestEntry>, CustomError>;
    async fn decide_join_request(&self, request_id: u32, host_id: u32, decision: Decision) -> Result<JoinRequest, CustomError>;
    async fn join_requests_by_user(&self, user_id: u32) -> Result<Vec<UserJoinRequest>, CustomError>;
}
