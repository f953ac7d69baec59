use axum::{
    Extension, Json, response::IntoResponse,
    extract::{Path, Query, TypedHeader, State, rejection::{JsonRejection, PathRejection, QueryRejection}},
    headers::{Authorization, authorization::Bearer},
    http::StatusCode,
};
use log::{error, info};

use crate::models::game::*;
use crate::errors::CustomError;
use crate::store::DynStore;

use crate::AppState;
use crate::{check_access, optional_access, rejected};

//handler for creating a new game. The caller becomes the host.
pub async fn new_game(  State(state): State<AppState>,
                        Extension(store): Extension<DynStore>,
                        bearer: Option<TypedHeader<Authorization<Bearer>>>,
                        newgame: Result<Json<NewGame>, JsonRejection>,
                        ) -> Result<impl IntoResponse, CustomError> {

    info!("new game request");

    //check if user is logged in, bail out if not. Retrieve the user id from the bearer token
    let host_id = check_access(&state, &bearer).await?;
    let Json(newgame) = rejected(newgame)?;

    if let Err(err) = newgame.validate() {
        info!("Rejected new game: {:?}", err);
        return Err(err);
    }

    let game = store.create_game(host_id, newgame).await?;
    info!("game {} created by user {}", game.id, host_id);

    Ok((StatusCode::CREATED, Json(game)))
}

/////////////////////////////////////////////////////////////////////////////////////////////////////////////////
//handler for browsing games. Anonymous callers are welcome, a logged in caller does not see their own games.
pub async fn list_games(    State(state): State<AppState>,
                            Extension(store): Extension<DynStore>,
                            bearer: Option<TypedHeader<Authorization<Bearer>>>,
                            filter: Result<Query<GameFilter>, QueryRejection>,
                            ) -> Result<impl IntoResponse, CustomError> {

    info!("list games request");

    let Query(filter) = rejected(filter)?;
    let viewer = optional_access(&state, &bearer).await?;
    let games = store.list_games(&filter, viewer).await?;

    Ok((StatusCode::OK, Json(games)))
}

/////////////////////////////////////////////////////////////////////////////////////////////////////////////////
//handler for looking up one game. Private games only exist for their host.
pub async fn get_game(  game_id: Result<Path<u32>, PathRejection>,
                        State(state): State<AppState>,
                        Extension(store): Extension<DynStore>,
                        bearer: Option<TypedHeader<Authorization<Bearer>>>,
                        ) -> Result<impl IntoResponse, CustomError> {

    info!("get game request");

    let Path(game_id) = rejected(game_id)?;

    let viewer = optional_access(&state, &bearer).await?;
    let game = store.game(game_id).await?;
    if !game.is_visible_to(viewer) {
        return Err(CustomError::GameNotFound);
    }

    Ok((StatusCode::OK, Json(game)))
}

/////////////////////////////////////////////////////////////////////////////////////////////////////////////////
//handler for the games hosted by the logged in user
pub async fn hosted_games(  State(state): State<AppState>,
                            Extension(store): Extension<DynStore>,
                            bearer: Option<TypedHeader<Authorization<Bearer>>>,
                            ) -> Result<impl IntoResponse, CustomError> {

    info!("hosted games request");

    let host_id = check_access(&state, &bearer).await?;
    let games = store.hosted_games(host_id).await?;

    Ok((StatusCode::OK, Json(games)))
}

/////////////////////////////////////////////////////////////////////////////////////////////////////////////////
//handler for cancelling a game. Only the host can do this and a cancelled game stays cancelled.
pub async fn cancel_game(   game_id: Result<Path<u32>, PathRejection>,
                            State(state): State<AppState>,
                            Extension(store): Extension<DynStore>,
                            bearer: Option<TypedHeader<Authorization<Bearer>>>,
                            ) -> Result<impl IntoResponse, CustomError> {

    info!("cancel game request");

    let Path(game_id) = rejected(game_id)?;

    let host_id = check_access(&state, &bearer).await?;
    let game = store.cancel_game(game_id, host_id).await.map_err(|err| {
        error!("Error cancelling game {}: {:?}", game_id, err);
        err
    })?;

    Ok((StatusCode::OK, Json(game)))
}
