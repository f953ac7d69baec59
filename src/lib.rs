use axum::{
    Extension, Router,
    routing::{get, post},
    extract::TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use log::{error, info};
use serde::{Deserialize, Serialize};

pub mod client;
pub mod config;
pub mod controllers;
pub mod errors;
pub mod models;
pub mod store;

use crate::errors::CustomError;
use crate::store::DynStore;

// The claims struct used for creating a Bearer token
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub iat: usize,
    pub exp: usize,
}

// Shared immutable state
#[derive(Clone)]
pub struct AppState {
    pub jwt_secret: String,
    pub token_duration: i64,
}

// Define routes. The store travels as an extension, the auth settings as state.
pub fn app(state: AppState, store: DynStore) -> Router {
    Router::new()
        .route("/signup", post(controllers::user::signup))
        .route("/login", get(controllers::user::login))
        .route("/user/me", get(controllers::user::me))
        .route("/user/:id", get(controllers::user::get_user))
        .route("/user/:id/game-stats", get(controllers::user::game_stats))
        .route("/games", get(controllers::game::list_games))
        .route("/hosted", get(controllers::game::hosted_games))
        .route("/game", post(controllers::game::new_game))
        .route("/game/:game_id", get(controllers::game::get_game))
        .route("/game/:game_id/cancel", post(controllers::game::cancel_game))
        .route("/game/:game_id/join-status", get(controllers::join_request::join_status))
        .route("/game/:game_id/join", post(controllers::join_request::join_game))
        .route("/game/:game_id/join-requests", get(controllers::join_request::game_join_requests))
        .route("/join-request/:request_id", post(controllers::join_request::decide_join_request))
        .route("/join-requests", get(controllers::join_request::my_join_requests))
        .with_state(state)
        .layer(Extension(store))
}

// Helper function to check if a bearer token is valid (user is logged in).
// Returns the user id from the sub claim. Nearly every handler needs it.
// A missing or malformed Authorization header counts as an invalid token.
pub async fn check_access(state: &AppState, bearer: &Option<TypedHeader<Authorization<Bearer>>>) -> Result<u32, CustomError> {

    let Some(TypedHeader(bearer)) = bearer else {
        info!("Request without bearer token");
        return Err(CustomError::InvalidToken);
    };

    // Decode the Bearer token from the header. When succesfull return the user id (sub field)
    match decode::<Claims>(
        bearer.token(),
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(token_data) => token_data.claims.sub.parse::<u32>().map_err(|err| {
            error!("Token subject is not a user id: {:?}", err);
            CustomError::InvalidToken
        }),
        Err(err) => {
            error!("Invalid token: {:?}", err.kind());
            Err(CustomError::InvalidToken)
        }
    }
}

// Same as check_access for endpoints that also serve anonymous callers.
// A token that is present but invalid is still rejected.
pub async fn optional_access(state: &AppState, bearer: &Option<TypedHeader<Authorization<Bearer>>>) -> Result<Option<u32>, CustomError> {
    match bearer {
        Some(_) => check_access(state, bearer).await.map(Some),
        None => Ok(None),
    }
}

// Unwraps an extractor result, turning axum's rejection into our json error
pub fn rejected<T, R: std::fmt::Display>(extracted: Result<T, R>) -> Result<T, CustomError> {
    extracted.map_err(|rejection| {
        info!("Rejected request: {}", rejection);
        CustomError::BadRequest
    })
}
