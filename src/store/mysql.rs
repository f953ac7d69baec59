use async_trait::async_trait;
use chrono::Utc;
use log::error;
use sqlx::{MySql, MySqlPool, Transaction};

use super::Store;
use crate::errors::CustomError;
use crate::models::game::{Game, GameFilter, NewGame};
use crate::models::join_request::{Decision, JoinRequest, JoinRequestEntry, RequestStatus, UserJoinRequest};
use crate::models::user::{GameStats, SignUp, User};

// MySQL error code for a duplicate key
const DUPLICATE_ENTRY: &str = "23000";

// Store backed by the schema in schema.sql
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> Result<Transaction<'static, MySql>, CustomError> {
        self.pool.begin().await.map_err(db_error("starting transaction"))
    }
}

// Logs the database error and hides it behind an internal server error
fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> CustomError {
    move |err| {
        error!("Error {}: {:?}", context, err);
        CustomError::InternalServerError
    }
}

fn is_duplicate(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .map_or(false, |code| code == DUPLICATE_ENTRY)
}

async fn lock_game(tx: &mut Transaction<'static, MySql>, game_id: u32) -> Result<Game, CustomError> {
    let sql = "SELECT * FROM game WHERE id = ? FOR UPDATE";
    sqlx::query_as::<_, Game>(sql)
        .bind(game_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("locking game"))?
        .ok_or(CustomError::GameNotFound)
}

#[async_trait]
impl Store for MySqlStore {
    async fn create_user(&self, signup: &SignUp, password_hash: &str) -> Result<User, CustomError> {
        let sql = "INSERT INTO user (name, password_hash, display_name, email) VALUES (?, ?, ?, ?)";
        let id = match sqlx::query(sql)
            .bind(&signup.name)
            .bind(password_hash)
            .bind(&signup.display_name)
            .bind(&signup.email)
            .execute(&self.pool)
            .await {
                Ok(result) => result.last_insert_id() as u32,
                Err(err) if is_duplicate(&err) => return Err(CustomError::UserExists),
                Err(err) => return Err(db_error("creating user")(err)),
            };
        self.user_by_id(id).await
    }

    async fn user_by_name(&self, name: &str) -> Result<User, CustomError> {
        let sql = "SELECT * FROM user WHERE name = ?";
        sqlx::query_as::<_, User>(sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetching user"))?
            .ok_or(CustomError::UserNotFound)
    }

    async fn user_by_id(&self, id: u32) -> Result<User, CustomError> {
        let sql = "SELECT * FROM user WHERE id = ?";
        sqlx::query_as::<_, User>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetching user"))?
            .ok_or(CustomError::UserNotFound)
    }

    async fn game_stats(&self, user_id: u32) -> Result<GameStats, CustomError> {
        self.user_by_id(user_id).await?;

        let sql = "SELECT \
                   (SELECT COUNT(*) FROM game WHERE host_id = ?), \
                   (SELECT COUNT(*) FROM join_request WHERE requester_id = ? AND status = ?)";
        let (games_hosted, games_joined): (i64, i64) = sqlx::query_as(sql)
            .bind(user_id)
            .bind(user_id)
            .bind(RequestStatus::Accepted)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("counting games"))?;

        Ok(GameStats {
            games_hosted: games_hosted as u32,
            games_joined: games_joined as u32,
        })
    }

    async fn create_game(&self, host_id: u32, new_game: NewGame) -> Result<Game, CustomError> {
        let sql = "INSERT INTO game (sport, title, description, location, date_time, current_players_count, \
                   needed_players_count, skill_level, visibility, status, host_id) \
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";
        let game_id = sqlx::query(sql)
            .bind(new_game.sport)
            .bind(&new_game.title)
            .bind(&new_game.description)
            .bind(&new_game.location)
            .bind(new_game.date_time)
            .bind(new_game.current_players_count)
            .bind(new_game.needed_players_count)
            .bind(new_game.skill_level)
            .bind(new_game.visibility)
            .bind(new_game.initial_status())
            .bind(host_id)
            .execute(&self.pool)
            .await
            .map_err(db_error("creating game"))?
            .last_insert_id() as u32;

        self.game(game_id).await
    }

    async fn game(&self, id: u32) -> Result<Game, CustomError> {
        let sql = "SELECT * FROM game WHERE id = ?";
        sqlx::query_as::<_, Game>(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetching game"))?
            .ok_or(CustomError::GameNotFound)
    }

    async fn list_games(&self, filter: &GameFilter, viewer: Option<u32>) -> Result<Vec<Game>, CustomError> {
        // NULL placeholders switch the optional conditions off
        let sql = "SELECT * FROM game WHERE visibility = 'public' \
                   AND (? IS NULL OR host_id <> ?) \
                   AND (? IS NULL OR sport = ?) \
                   AND (? IS NULL OR skill_level = ?) \
                   AND (? IS NULL OR title LIKE ? OR location LIKE ? OR description LIKE ?) \
                   ORDER BY date_time";
        let pattern = filter.search_term().map(|term| format!("%{}%", term));
        sqlx::query_as::<_, Game>(sql)
            .bind(viewer)
            .bind(viewer)
            .bind(filter.sport)
            .bind(filter.sport)
            .bind(filter.skill_level)
            .bind(filter.skill_level)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("listing games"))
    }

    async fn hosted_games(&self, host_id: u32) -> Result<Vec<Game>, CustomError> {
        let sql = "SELECT * FROM game WHERE host_id = ? ORDER BY date_time";
        sqlx::query_as::<_, Game>(sql)
            .bind(host_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("listing hosted games"))
    }

    async fn cancel_game(&self, game_id: u32, host_id: u32) -> Result<Game, CustomError> {
        let mut tx = self.begin().await?;
        let mut game = lock_game(&mut tx, game_id).await?;
        if !game.is_visible_to(Some(host_id)) {
            return Err(CustomError::GameNotFound);
        }
        if game.host_id != host_id {
            return Err(CustomError::NotHost);
        }
        game.cancel()?;
        game.updated_at = Utc::now();

        let sql = "UPDATE game SET status = ?, updated_at = ? WHERE id = ?";
        sqlx::query(sql)
            .bind(game.status)
            .bind(game.updated_at)
            .bind(game.id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("cancelling game"))?;

        tx.commit().await.map_err(db_error("cancelling game"))?;
        Ok(game)
    }

    async fn join_request_for(&self, game_id: u32, requester_id: u32) -> Result<Option<JoinRequest>, CustomError> {
        let sql = "SELECT * FROM join_request WHERE game_id = ? AND requester_id = ? ORDER BY id DESC LIMIT 1";
        sqlx::query_as::<_, JoinRequest>(sql)
            .bind(game_id)
            .bind(requester_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetching join request"))
    }

    async fn submit_join_request(&self, game_id: u32, requester_id: u32) -> Result<JoinRequest, CustomError> {
        let mut tx = self.begin().await?;
        let game = lock_game(&mut tx, game_id).await?;
        if !game.is_visible_to(Some(requester_id)) {
            return Err(CustomError::GameNotFound);
        }
        game.check_joinable_by(requester_id)?;

        let request = JoinRequest::new(0, game_id, requester_id, Utc::now());
        let sql = "INSERT INTO join_request (game_id, requester_id, status, created_at) VALUES (?, ?, ?, ?)";
        let id = match sqlx::query(sql)
            .bind(request.game_id)
            .bind(request.requester_id)
            .bind(request.status)
            .bind(request.created_at)
            .execute(&mut *tx)
            .await {
                Ok(result) => result.last_insert_id() as u32,
                // unique key on (game_id, requester_id)
                Err(err) if is_duplicate(&err) => return Err(CustomError::AlreadyRequested),
                Err(err) => return Err(db_error("creating join request")(err)),
            };

        tx.commit().await.map_err(db_error("creating join request"))?;
        Ok(JoinRequest { id, ..request })
    }

    async fn join_requests_for_game(&self, game_id: u32, host_id: u32) -> Result<Vec<JoinRequestEntry>, CustomError> {
        let game = self.game(game_id).await?;
        if !game.is_visible_to(Some(host_id)) {
            return Err(CustomError::GameNotFound);
        }
        if game.host_id != host_id {
            return Err(CustomError::NotHost);
        }

        let sql = "SELECT join_request.id, join_request.requester_id, \
                   user.display_name AS requester_display_name, user.email AS requester_email, \
                   join_request.status \
                   FROM join_request INNER JOIN user ON join_request.requester_id = user.id \
                   WHERE join_request.game_id = ? ORDER BY join_request.id";
        sqlx::query_as::<_, JoinRequestEntry>(sql)
            .bind(game_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("listing join requests"))
    }

    async fn decide_join_request(&self, request_id: u32, host_id: u32, decision: Decision) -> Result<JoinRequest, CustomError> {
        let mut tx = self.begin().await?;

        let sql = "SELECT * FROM join_request WHERE id = ? FOR UPDATE";
        let mut request = sqlx::query_as::<_, JoinRequest>(sql)
            .bind(request_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("locking join request"))?
            .ok_or(CustomError::JoinRequestNotFound)?;
        let mut game = lock_game(&mut tx, request.game_id).await?;

        request.apply_decision(&mut game, host_id, decision, Utc::now())?;

        // The status guard keeps a second decision from overwriting the first
        let sql = "UPDATE join_request SET status = ?, decided_at = ? WHERE id = ? AND status = ?";
        let updated = sqlx::query(sql)
            .bind(request.status)
            .bind(request.decided_at)
            .bind(request.id)
            .bind(RequestStatus::Requested)
            .execute(&mut *tx)
            .await
            .map_err(db_error("deciding join request"))?
            .rows_affected();
        if updated != 1 {
            return Err(CustomError::AlreadyDecided);
        }

        if request.status == RequestStatus::Accepted {
            let sql = "UPDATE game SET current_players_count = ?, status = ?, updated_at = ? WHERE id = ?";
            sqlx::query(sql)
                .bind(game.current_players_count)
                .bind(game.status)
                .bind(game.updated_at)
                .bind(game.id)
                .execute(&mut *tx)
                .await
                .map_err(db_error("admitting player"))?;
        }

        tx.commit().await.map_err(db_error("deciding join request"))?;
        Ok(request)
    }

    async fn join_requests_by_user(&self, user_id: u32) -> Result<Vec<UserJoinRequest>, CustomError> {
        let sql = "SELECT * FROM join_request WHERE requester_id = ? ORDER BY id DESC";
        let requests = sqlx::query_as::<_, JoinRequest>(sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("listing user join requests"))?;

        let mut result = Vec::with_capacity(requests.len());
        for request in requests {
            result.push(UserJoinRequest {
                id: request.id,
                status: request.status,
                created_at: request.created_at,
                game: self.game(request.game_id).await?,
            });
        }
        Ok(result)
    }
}
