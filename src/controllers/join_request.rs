use axum::{
    Extension, Json, response::IntoResponse,
    extract::{Path, TypedHeader, State, rejection::{JsonRejection, PathRejection}},
    headers::{Authorization, authorization::Bearer},
    http::StatusCode,
};
use log::{error, info};

use crate::models::join_request::*;
use crate::errors::CustomError;
use crate::store::DynStore;

use crate::AppState;
use crate::{check_access, rejected};

/////////////////////////////////////////////////////////////////////////////////////////////////////////////////
//handler for the join status of the logged in user for a game. Safe to call before any request exists.
pub async fn join_status(   game_id: Result<Path<u32>, PathRejection>,
                            State(state): State<AppState>,
                            Extension(store): Extension<DynStore>,
                            bearer: Option<TypedHeader<Authorization<Bearer>>>,
                            ) -> Result<impl IntoResponse, CustomError> {

    info!("join status request");

    let Path(game_id) = rejected(game_id)?;

    let user_id = check_access(&state, &bearer).await?;

    let game = store.game(game_id).await?;
    if !game.is_visible_to(Some(user_id)) {
        return Err(CustomError::GameNotFound);
    }

    let request = store.join_request_for(game_id, user_id).await?;
    let status = JoinStatus::from(request.map(|r| r.status));

    Ok((StatusCode::OK, Json(JoinStatusResponse { status })))
}

/////////////////////////////////////////////////////////////////////////////////////////////////////////////////
//handler for requesting to join a game.
pub async fn join_game( game_id: Result<Path<u32>, PathRejection>,
                        State(state): State<AppState>,
                        Extension(store): Extension<DynStore>,
                        bearer: Option<TypedHeader<Authorization<Bearer>>>
                        ) -> Result<impl IntoResponse, CustomError> {

    info!("Join game request");

    let Path(game_id) = rejected(game_id)?;

    //check if user is logged in, bail out if not. Retrieve the user id from the bearer token
    let user_id = check_access(&state, &bearer).await?;

    // Existence, host, capacity and duplicate checks happen atomically in the store
    let request = store.submit_join_request(game_id, user_id).await.map_err(|err| {
        info!("User {} could not join game {}: {:?}", user_id, game_id, err);
        err
    })?;

    Ok((StatusCode::CREATED, Json(request)))
}

/////////////////////////////////////////////////////////////////////////////////////////////////////////////////
//handler returning every join request for a game. Host only.
pub async fn game_join_requests(    game_id: Result<Path<u32>, PathRejection>,
                                    State(state): State<AppState>,
                                    Extension(store): Extension<DynStore>,
                                    bearer: Option<TypedHeader<Authorization<Bearer>>>,
                                    ) -> Result<impl IntoResponse, CustomError> {

    info!("game join requests request");

    let Path(game_id) = rejected(game_id)?;

    let host_id = check_access(&state, &bearer).await?;
    let requests = store.join_requests_for_game(game_id, host_id).await?;

    Ok((StatusCode::OK, Json(requests)))
}

/////////////////////////////////////////////////////////////////////////////////////////////////////////////////
//handler for accepting or rejecting a join request. Host only, and only once per request.
pub async fn decide_join_request(   request_id: Result<Path<u32>, PathRejection>,
                                    State(state): State<AppState>,
                                    Extension(store): Extension<DynStore>,
                                    bearer: Option<TypedHeader<Authorization<Bearer>>>,
                                    body: Result<Json<DecisionRequest>, JsonRejection>,
                                    ) -> Result<impl IntoResponse, CustomError> {

    info!("decide join request request");

    let Path(request_id) = rejected(request_id)?;

    let host_id = check_access(&state, &bearer).await?;
    let Json(body) = rejected(body)?;
    let decision = body.status.parse::<Decision>()?;

    let request = store.decide_join_request(request_id, host_id, decision).await.map_err(|err| {
        error!("Error deciding join request {} ({}): {:?}", request_id, decision, err);
        err
    })?;
    info!("join request {} {}", request.id, decision);

    Ok((StatusCode::OK, Json(request)))
}

/////////////////////////////////////////////////////////////////////////////////////////////////////////////////
//handler for the join requests of the logged in user, newest first
pub async fn my_join_requests(  State(state): State<AppState>,
                                Extension(store): Extension<DynStore>,
                                bearer: Option<TypedHeader<Authorization<Bearer>>>,
                                ) -> Result<impl IntoResponse, CustomError> {

    info!("user join requests request");

    let user_id = check_access(&state, &bearer).await?;
    let requests = store.join_requests_by_user(user_id).await?;

    Ok((StatusCode::OK, Json(requests)))
}
