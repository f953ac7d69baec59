//! Client side of the REST contract.
//!
//! [`ApiClient`] performs single awaited round trips and maps every payload through
//! [`boundary`]. [`views`] builds the consistency rules on top of it: mutate, then refetch.

use log::{debug, info, warn};
use reqwest::{Method, RequestBuilder};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub mod boundary;
pub mod error;
pub mod session;
pub mod views;

pub use error::PlayError;
pub use session::Session;

use boundary::{
    decode, IntoCanonical, WireGame, WireJoinRequest, WireJoinRequestEntry, WireJoinStatus, WireUser,
    WireUserJoinRequest,
};
use crate::models::game::{Game, GameFilter, NewGame};
use crate::models::join_request::{Decision, DecisionRequest, JoinRequest, JoinRequestEntry, JoinStatus, UserJoinRequest};
use crate::models::user::{AuthResponse, GameStats, PublicUser, SignUp};

/// Typed access to the Play Plus server for one signed-in (or anonymous) user.
#[derive(Debug)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    session: RwLock<Session>,
}

// Payloads that are already canonical
#[derive(serde::Deserialize)]
#[serde(transparent)]
struct Plain<T>(T);

impl<T> IntoCanonical for Plain<T> {
    type Output = T;

    fn into_canonical(self) -> Result<T, PlayError> {
        Ok(self.0)
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_session(base_url, Session::default())
    }

    pub fn with_session(base_url: impl Into<String>, session: Session) -> Self {
        ApiClient {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            session: RwLock::new(session),
        }
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.read_session().clone()
    }

    fn read_session(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match self.read_session().token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request and maps the body through the boundary layer.
    async fn send<W>(&self, builder: RequestBuilder) -> Result<W::Output, PlayError>
    where
        W: IntoCanonical + for<'de> serde::Deserialize<'de>,
    {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = PlayError::message_from_body(status, &body);
            debug!("request failed with {}: {}", status, message);
            return Err(PlayError::from_status(status, message));
        }
        decode::<W>(&body)
    }

    // ---- session ----

    /// Registers a new account. Does not sign in.
    pub async fn register(&self, signup: &SignUp) -> Result<PublicUser, PlayError> {
        let builder = self.request(Method::POST, "/signup").json(signup);
        self.send::<WireUser>(builder).await
    }

    /// Exchanges credentials for a token, then refreshes the session.
    pub async fn login(&self, name: &str, password: &str) -> Result<PublicUser, PlayError> {
        let builder = self
            .http
            .get(format!("{}/login", self.base_url))
            .basic_auth(name, Some(password));
        let auth = self.send::<Plain<AuthResponse>>(builder).await?;
        self.write_session().set_token(auth.access_token);

        match self.refresh().await? {
            Some(user) => {
                info!("signed in as {}", user.name);
                Ok(user)
            }
            None => Err(PlayError::Unauthorized("the new token was not accepted".to_string())),
        }
    }

    /// Tokens are stateless on the server, so forgetting it is all there is to do.
    pub fn logout(&self) {
        self.write_session().clear();
    }

    /// Resolves the stored token into the current user. A rejected token clears the session.
    pub async fn refresh(&self) -> Result<Option<PublicUser>, PlayError> {
        if self.read_session().token().is_none() {
            return Ok(None);
        }
        match self.send::<WireUser>(self.request(Method::GET, "/user/me")).await {
            Ok(user) => {
                self.write_session().set_user(user.clone());
                Ok(Some(user))
            }
            Err(PlayError::Unauthorized(message)) => {
                warn!("stored token rejected: {}", message);
                self.write_session().clear();
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    // ---- users ----

    pub async fn user(&self, user_id: u32) -> Result<PublicUser, PlayError> {
        self.send::<WireUser>(self.request(Method::GET, &format!("/user/{}", user_id))).await
    }

    pub async fn game_stats(&self, user_id: u32) -> Result<GameStats, PlayError> {
        self.send::<Plain<GameStats>>(self.request(Method::GET, &format!("/user/{}/game-stats", user_id)))
            .await
    }

    // ---- games ----

    pub async fn games(&self, filter: &GameFilter) -> Result<Vec<Game>, PlayError> {
        let builder = self.request(Method::GET, "/games").query(filter);
        self.send::<Vec<WireGame>>(builder).await
    }

    pub async fn hosted_games(&self) -> Result<Vec<Game>, PlayError> {
        self.send::<Vec<WireGame>>(self.request(Method::GET, "/hosted")).await
    }

    pub async fn game(&self, game_id: u32) -> Result<Game, PlayError> {
        self.send::<WireGame>(self.request(Method::GET, &format!("/game/{}", game_id))).await
    }

    pub async fn create_game(&self, new_game: &NewGame) -> Result<Game, PlayError> {
        let builder = self.request(Method::POST, "/game").json(new_game);
        self.send::<WireGame>(builder).await
    }

    pub async fn cancel_game(&self, game_id: u32) -> Result<Game, PlayError> {
        self.send::<WireGame>(self.request(Method::POST, &format!("/game/{}/cancel", game_id)))
            .await
    }

    // ---- join requests ----

    /// `NotRequested` when the caller never asked to join.
    pub async fn join_status(&self, game_id: u32) -> Result<JoinStatus, PlayError> {
        self.send::<WireJoinStatus>(self.request(Method::GET, &format!("/game/{}/join-status", game_id)))
            .await
    }

    pub async fn submit_join_request(&self, game_id: u32) -> Result<JoinRequest, PlayError> {
        self.send::<WireJoinRequest>(self.request(Method::POST, &format!("/game/{}/join", game_id)))
            .await
    }

    pub async fn join_requests(&self, game_id: u32) -> Result<Vec<JoinRequestEntry>, PlayError> {
        self.send::<Vec<WireJoinRequestEntry>>(
            self.request(Method::GET, &format!("/game/{}/join-requests", game_id)),
        )
        .await
    }

    pub async fn decide_join_request(&self, request_id: u32, decision: Decision) -> Result<JoinRequest, PlayError> {
        let body = DecisionRequest {
            status: decision.to_string(),
        };
        let builder = self.request(Method::POST, &format!("/join-request/{}", request_id)).json(&body);
        self.send::<WireJoinRequest>(builder).await
    }

    pub async fn my_join_requests(&self) -> Result<Vec<UserJoinRequest>, PlayError> {
        self.send::<Vec<WireUserJoinRequest>>(self.request(Method::GET, "/join-requests")).await
    }
}
