//! View models that keep roster and request status consistent with the server.
//!
//! The rules every view follows:
//! * after a mutation the game and the affected requests are refetched, counts are never
//!   patched locally;
//! * a conflict is the server's truth, so the view refetches instead of retrying;
//! * results arriving after [`Mount::unmount`] are dropped;
//! * one mutation at a time per view, a second one fails with [`PlayError::Busy`].

use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{ApiClient, PlayError};
use crate::models::game::{Game, GameStatus};
use crate::models::join_request::{Decision, JoinRequestEntry, JoinStatus};
use crate::models::user::PublicUser;

/// Shared flag telling in-flight loads whether anyone still wants their result.
#[derive(Debug, Clone)]
pub struct Mount(Arc<AtomicBool>);

impl Mount {
    fn new() -> Self {
        Mount(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_mounted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn unmount(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The "disabled button": set while a mutation is awaiting its response.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Arc<AtomicBool>);

impl InFlight {
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn start(&self) -> Result<InFlightGuard, PlayError> {
        self.0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| InFlightGuard(self.0.clone()))
            .map_err(|_| PlayError::Busy)
    }
}

struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostInfo {
    Known(PublicUser),
    /// The host lookup failed; the page still renders.
    Unknown,
}

/// What the game page offers the viewer. Every combination of inputs maps to one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinAction {
    SignInRequired,
    OwnGame,
    RequestToJoin,
    Pending,
    Accepted,
    Rejected,
    Closed(GameStatus),
    Full,
}

impl JoinAction {
    pub fn resolve(viewer: Option<u32>, game: &Game, status: Option<JoinStatus>) -> JoinAction {
        let Some(viewer) = viewer else {
            return JoinAction::SignInRequired;
        };
        if viewer == game.host_id {
            return JoinAction::OwnGame;
        }
        match status {
            Some(JoinStatus::Requested) => JoinAction::Pending,
            Some(JoinStatus::Accepted) => JoinAction::Accepted,
            Some(JoinStatus::Rejected) => JoinAction::Rejected,
            // Unknown status is treated as not requested; the server rejects duplicates anyway
            Some(JoinStatus::NotRequested) | None => match game.status {
                GameStatus::Open if game.remaining_slots() > 0 => JoinAction::RequestToJoin,
                GameStatus::Open => JoinAction::Full,
                status @ (GameStatus::Filled | GameStatus::Cancelled) => JoinAction::Closed(status),
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JoinAction::SignInRequired => "Sign in to join",
            JoinAction::OwnGame => "You are hosting this game",
            JoinAction::RequestToJoin => "Request to Join",
            JoinAction::Pending => "Request Pending",
            JoinAction::Accepted => "Request Accepted",
            JoinAction::Rejected => "Request Rejected",
            JoinAction::Closed(GameStatus::Cancelled) => "Game cancelled",
            JoinAction::Closed(_) => "Game is full",
            JoinAction::Full => "No slots left",
        }
    }
}

/// Game page as seen by a prospective player.
#[derive(Debug)]
pub struct GameDetailView {
    client: Arc<ApiClient>,
    game_id: u32,
    mount: Mount,
    in_flight: InFlight,
    pub game: Option<Game>,
    pub host: HostInfo,
    pub join_status: Option<JoinStatus>,
    pub last_error: Option<String>,
}

impl GameDetailView {
    pub fn new(client: Arc<ApiClient>, game_id: u32) -> Self {
        GameDetailView {
            client,
            game_id,
            mount: Mount::new(),
            in_flight: InFlight::default(),
            game: None,
            host: HostInfo::Unknown,
            join_status: None,
            last_error: None,
        }
    }

    pub fn mount_handle(&self) -> Mount {
        self.mount.clone()
    }

    pub fn in_flight(&self) -> InFlight {
        self.in_flight.clone()
    }

    // Nobody reads the error of an unmounted view
    fn record_error(&mut self, err: &PlayError) {
        if self.mount.is_mounted() {
            self.last_error = Some(err.to_string());
        }
    }

    pub fn join_action(&self) -> Option<JoinAction> {
        let game = self.game.as_ref()?;
        Some(JoinAction::resolve(self.client.session().user_id(), game, self.join_status))
    }

    /// Fetches game, host and the viewer's join status.
    pub async fn load(&mut self) -> Result<(), PlayError> {
        let result = self.fetch().await;
        if !self.mount.is_mounted() {
            debug!("game {} view unmounted, dropping result", self.game_id);
            return Ok(());
        }
        match result {
            Ok((game, host, join_status)) => {
                self.game = Some(game);
                self.host = host;
                self.join_status = join_status;
                Ok(())
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    async fn fetch(&self) -> Result<(Game, HostInfo, Option<JoinStatus>), PlayError> {
        let game = self.client.game(self.game_id).await?;

        let host = match self.client.user(game.host_id).await {
            Ok(user) => HostInfo::Known(user),
            Err(err) => {
                warn!("host {} of game {} unavailable: {}", game.host_id, game.id, err);
                HostInfo::Unknown
            }
        };

        let join_status = if self.client.session().token().is_some() {
            Some(self.client.join_status(self.game_id).await?)
        } else {
            None
        };

        Ok((game, host, join_status))
    }

    /// Files a join request, then reloads the page from the server.
    pub async fn request_to_join(&mut self) -> Result<(), PlayError> {
        let _guard = self.in_flight.start()?;
        self.last_error = None;

        let outcome = self.client.submit_join_request(self.game_id).await;
        if let Err(err) = &outcome {
            if !err.is_conflict() {
                self.record_error(err);
                return outcome.map(|_| ());
            }
        }

        // Success and conflict both mean the server's state moved on
        self.load().await?;
        match outcome {
            Ok(_) => Ok(()),
            Err(err) => {
                self.record_error(&err);
                Err(err)
            }
        }
    }
}

/// A host's page for one of their games with its join requests.
#[derive(Debug)]
pub struct HostedGameView {
    client: Arc<ApiClient>,
    game_id: u32,
    mount: Mount,
    in_flight: InFlight,
    pub game: Option<Game>,
    pub requests: Vec<JoinRequestEntry>,
    pub last_error: Option<String>,
}

impl HostedGameView {
    pub fn new(client: Arc<ApiClient>, game_id: u32) -> Self {
        HostedGameView {
            client,
            game_id,
            mount: Mount::new(),
            in_flight: InFlight::default(),
            game: None,
            requests: Vec::new(),
            last_error: None,
        }
    }

    pub fn mount_handle(&self) -> Mount {
        self.mount.clone()
    }

    pub fn in_flight(&self) -> InFlight {
        self.in_flight.clone()
    }

    // Nobody reads the error of an unmounted view
    fn record_error(&mut self, err: &PlayError) {
        if self.mount.is_mounted() {
            self.last_error = Some(err.to_string());
        }
    }

    pub fn pending(&self) -> impl Iterator<Item = &JoinRequestEntry> {
        self.requests.iter().filter(|r| !r.status.is_terminal())
    }

    /// Reloads the game and the complete request list.
    pub async fn load(&mut self) -> Result<(), PlayError> {
        let result = async {
            let game = self.client.game(self.game_id).await?;
            let requests = self.client.join_requests(self.game_id).await?;
            Ok::<_, PlayError>((game, requests))
        }
        .await;
        if !self.mount.is_mounted() {
            debug!("hosted game {} view unmounted, dropping result", self.game_id);
            return Ok(());
        }
        match result {
            Ok((game, requests)) => {
                self.game = Some(game);
                self.requests = requests;
                Ok(())
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Accepts or rejects one request, then reloads everything on the page.
    pub async fn decide(&mut self, request_id: u32, decision: Decision) -> Result<(), PlayError> {
        let _guard = self.in_flight.start()?;
        self.last_error = None;

        let outcome = self.client.decide_join_request(request_id, decision).await;
        if let Err(err) = &outcome {
            if !err.is_conflict() {
                self.record_error(err);
                return outcome.map(|_| ());
            }
        }

        self.load().await?;
        match outcome {
            Ok(_) => Ok(()),
            Err(err) => {
                self.record_error(&err);
                Err(err)
            }
        }
    }

    pub async fn cancel_game(&mut self) -> Result<(), PlayError> {
        let _guard = self.in_flight.start()?;
        self.last_error = None;

        if let Err(err) = self.client.cancel_game(self.game_id).await {
            if err.is_conflict() {
                self.load().await?;
            }
            self.record_error(&err);
            return Err(err);
        }
        self.load().await
    }
}
