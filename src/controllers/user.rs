use axum::{
    Extension, Json, response::IntoResponse,
    extract::{Path, TypedHeader, State, rejection::{JsonRejection, PathRejection}},
    headers::{Authorization, authorization::{Basic, Bearer}},
    http::StatusCode,
};
use log::{debug, error, info};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use pwhash::bcrypt;

use crate::models::user::*;
use crate::errors::CustomError;
use crate::store::DynStore;
use crate::Claims;
use crate::{check_access, rejected};
use crate::AppState;

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////
//handler logging in. We extract Basic authentication to retrieve username and password from the store. If the
//password checks out we generate and return the JWT Bearer token which has the expiration and user id encoded within
///////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn login( State(state): State<AppState>,
                    Extension(store): Extension<DynStore>,
                    basic: Option<TypedHeader<Authorization<Basic>>>
                    ) -> Result<impl IntoResponse, CustomError> {

    // Missing credentials are treated like wrong ones
    let TypedHeader(basic) = basic.ok_or(CustomError::WrongPassword)?;
    info!("login request by user: {}", basic.username());

    // Fetch the user using the username from the basic authentication header
    let user = store.user_by_name(basic.username()).await.map_err(|err| {
        error!("error retrieving user: {:?}", err);
        CustomError::WrongPassword
    })?;

    //Check password hash is equal to stored password hash. if not, error out
    if !bcrypt::verify(basic.password(), &user.password_hash) {
        return Err(CustomError::WrongPassword);
    }

    // Define the registered <Expiration Time> claim (exp) which is the current timestmap plus the defined offset
    let now = Utc::now();
    let my_exp = now
        .checked_add_signed(Duration::seconds(state.token_duration))
        .ok_or(CustomError::InternalServerError)?
        .timestamp();

    let my_claims = Claims {
        sub: user.id.to_string(),               // user id
        name: user.name,                        // login name, for display
        iat: now.timestamp() as usize,          // valid from
        exp: my_exp as usize,                   // valid until
    };

    // generate the Bearer token
    match encode(
        &Header::default(),
        &my_claims,
        &EncodingKey::from_secret(state.jwt_secret.as_bytes())
    ) {
        Ok(token) => {
            debug!("Generated token for user {}", my_claims.sub);
            Ok((StatusCode::OK, Json(AuthResponse{access_token: token, token_type: "bearer".to_string(), expires_in: state.token_duration})))
        }
        Err(err) => {
            error!("Unexpected error while encoding the bearer token ({:?})", err);
            Err(CustomError::InternalServerError)
        }
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Handler for signing up. Anyone can register, the password is hashed before it is stored.
///////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn signup(    Extension(store): Extension<DynStore>,
                        signup: Result<Json<SignUp>, JsonRejection>,
                        ) -> Result<impl IntoResponse, CustomError> {

    info!("signup request");

    let Json(signup) = rejected(signup)?;
    signup.validate()?;

    // Create the password hash
    let password_hash = match bcrypt::hash(&signup.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Unexpected error encrypting password {:?}", err);
            return Err(CustomError::InternalServerError);
        }
    };

    let user = store.create_user(&signup, &password_hash).await?;
    info!("user {} signed up", user.id);

    Ok((StatusCode::CREATED, Json(PublicUser::from(user))))
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Handler for the logged in user.
///////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn me(    State(state): State<AppState>,
                    Extension(store): Extension<DynStore>,
                    bearer: Option<TypedHeader<Authorization<Bearer>>>,
                    ) -> Result<impl IntoResponse, CustomError> {

    let user_id = check_access(&state, &bearer).await?;

    // A token for a user that no longer exists is as good as an invalid one
    let user = store.user_by_id(user_id).await.map_err(|_| CustomError::InvalidToken)?;
    Ok((StatusCode::OK, Json(PublicUser::from(user))))
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Handler for looking up a user. Profiles are public.
///////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn get_user(  id: Result<Path<u32>, PathRejection>,
                        Extension(store): Extension<DynStore>,
                        ) -> Result<impl IntoResponse, CustomError> {

    info!("get user request");

    let Path(id) = rejected(id)?;

    let user = store.user_by_id(id).await?;
    Ok((StatusCode::OK, Json(PublicUser::from(user))))
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// Handler for the amount of games a user hosted and joined.
///////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn game_stats(    id: Result<Path<u32>, PathRejection>,
                            Extension(store): Extension<DynStore>,
                            ) -> Result<impl IntoResponse, CustomError> {

    let Path(id) = rejected(id)?;
    info!("game stats request for user {}", id);

    let stats = store.game_stats(id).await?;
    Ok((StatusCode::OK, Json(stats)))
}
