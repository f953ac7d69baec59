#![allow(dead_code)]

use chrono::{Duration, Utc};
use std::net::TcpListener;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use playplus::client::ApiClient;
use playplus::models::game::{Game, NewGame, SkillLevel, Sport, Visibility};
use playplus::models::user::{PublicUser, SignUp};
use playplus::store::{DynStore, MemoryStore};
use playplus::AppState;

pub const PASSWORD: &str = "correct horse";

/// Serves the full router on an ephemeral port and returns its base url.
pub fn spawn_app() -> String {
    spawn_app_with(Arc::new(MemoryStore::new()))
}

/// Same as [`spawn_app`] over a store the test can seed directly.
pub fn spawn_app_with(store: DynStore) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind test listener");
    listener.set_nonblocking(true).expect("failed to set listener non-blocking");
    let addr = listener.local_addr().expect("listener has no address");

    let state = AppState {
        jwt_secret: "integration-secret".to_string(),
        token_duration: 3600,
    };
    let app = playplus::app(state, store);

    let server = axum::Server::from_tcp(listener)
        .expect("failed to build server")
        .serve(app.into_make_service());
    tokio::spawn(server);

    format!("http://{}", addr)
}

fn unique_name(prefix: &str) -> String {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    format!("{}{}", prefix, COUNTER.fetch_add(1, Ordering::SeqCst))
}

/// Registers a fresh user and returns a client signed in as them.
pub async fn signed_in(base_url: &str, prefix: &str) -> (Arc<ApiClient>, PublicUser) {
    let name = unique_name(prefix);
    let client = ApiClient::new(base_url);
    let signup = SignUp {
        name: name.clone(),
        password: PASSWORD.to_string(),
        display_name: format!("{} Player", name),
        email: format!("{}@example.com", name),
    };
    client.register(&signup).await.expect("signup failed");
    let user = client.login(&name, PASSWORD).await.expect("login failed");
    (Arc::new(client), user)
}

pub fn new_game(current: u32, needed: u32, visibility: Visibility) -> NewGame {
    NewGame {
        sport: Sport::Football,
        title: "Thursday five-a-side".to_string(),
        description: Some("Bring both shirts".to_string()),
        location: "Riverside pitch 2".to_string(),
        date_time: Utc::now() + Duration::days(2),
        current_players_count: current,
        needed_players_count: needed,
        skill_level: SkillLevel::Intermediate,
        visibility,
    }
}

pub async fn hosted_game(host: &ApiClient, current: u32, needed: u32) -> Game {
    host.create_game(&new_game(current, needed, Visibility::Public))
        .await
        .expect("game creation failed")
}
