mod common;

use std::sync::Arc;

use common::*;
use playplus::client::views::{GameDetailView, HostInfo, HostedGameView, JoinAction};
use playplus::client::{ApiClient, PlayError};
use playplus::models::game::{GameStatus, Visibility};
use playplus::models::join_request::{Decision, JoinStatus, RequestStatus};
use playplus::store::{MemoryStore, Store};

#[tokio::test]
async fn test_request_to_join_refetches() {
    let base_url = spawn_app();
    let (host, host_user) = signed_in(&base_url, "host").await;
    let (player, _) = signed_in(&base_url, "player").await;
    let game = hosted_game(&host, 4, 10).await;

    let mut view = GameDetailView::new(player.clone(), game.id);
    view.load().await.unwrap();
    assert_eq!(view.host, HostInfo::Known(host_user));
    assert_eq!(view.join_status, Some(JoinStatus::NotRequested));
    assert_eq!(view.join_action(), Some(JoinAction::RequestToJoin));

    view.request_to_join().await.unwrap();
    assert_eq!(view.join_action(), Some(JoinAction::Pending));
    assert!(!view.in_flight().is_busy());

    // The duplicate is refused and the page shows what the server holds
    let err = view.request_to_join().await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(view.join_status, Some(JoinStatus::Requested));
    assert_eq!(view.last_error.as_deref(), Some("Join request already exists"));

    let mut own = GameDetailView::new(host.clone(), game.id);
    own.load().await.unwrap();
    assert_eq!(own.join_action(), Some(JoinAction::OwnGame));
}

#[tokio::test]
async fn test_anonymous_viewer_must_sign_in() {
    let base_url = spawn_app();
    let (host, _) = signed_in(&base_url, "host").await;
    let game = hosted_game(&host, 4, 10).await;

    let mut view = GameDetailView::new(Arc::new(ApiClient::new(&base_url)), game.id);
    view.load().await.unwrap();
    assert_eq!(view.join_status, None);
    assert_eq!(view.join_action(), Some(JoinAction::SignInRequired));
}

#[tokio::test]
async fn test_host_decisions_reload_roster() {
    let base_url = spawn_app();
    let (host, _) = signed_in(&base_url, "host").await;
    let (first, _) = signed_in(&base_url, "first").await;
    let (second, _) = signed_in(&base_url, "second").await;
    let game = hosted_game(&host, 8, 10).await;

    let first_request = first.submit_join_request(game.id).await.unwrap();
    let second_request = second.submit_join_request(game.id).await.unwrap();

    let mut view = HostedGameView::new(host.clone(), game.id);
    view.load().await.unwrap();
    assert_eq!(view.pending().count(), 2);

    view.decide(first_request.id, Decision::Accepted).await.unwrap();
    let roster = view.game.as_ref().unwrap();
    assert_eq!(roster.current_players_count, 9);
    assert_eq!(roster.status, GameStatus::Open);
    assert_eq!(view.pending().count(), 1);

    view.decide(second_request.id, Decision::Accepted).await.unwrap();
    let roster = view.game.as_ref().unwrap();
    assert_eq!(roster.current_players_count, 10);
    assert_eq!(roster.status, GameStatus::Filled);
    assert_eq!(view.pending().count(), 0);

    let err = view.decide(second_request.id, Decision::Rejected).await.unwrap_err();
    assert!(err.is_conflict());
    let entry = view.requests.iter().find(|r| r.id == second_request.id).unwrap();
    assert_eq!(entry.status, RequestStatus::Accepted);
    assert!(view.last_error.is_some());

    let mut player_view = GameDetailView::new(second.clone(), game.id);
    player_view.load().await.unwrap();
    assert_eq!(player_view.join_action(), Some(JoinAction::Accepted));
}

#[tokio::test]
async fn test_cancel_from_hosted_view() {
    let base_url = spawn_app();
    let (host, _) = signed_in(&base_url, "host").await;
    let (player, _) = signed_in(&base_url, "player").await;
    let game = hosted_game(&host, 4, 10).await;

    let mut view = HostedGameView::new(host.clone(), game.id);
    view.cancel_game().await.unwrap();
    assert_eq!(view.game.as_ref().unwrap().status, GameStatus::Cancelled);

    let mut player_view = GameDetailView::new(player.clone(), game.id);
    player_view.load().await.unwrap();
    assert_eq!(player_view.join_action(), Some(JoinAction::Closed(GameStatus::Cancelled)));
}

#[tokio::test]
async fn test_unmounted_view_discards_results() {
    let base_url = spawn_app();
    let (host, _) = signed_in(&base_url, "host").await;
    let (player, _) = signed_in(&base_url, "player").await;
    let game = hosted_game(&host, 4, 10).await;

    let mut view = GameDetailView::new(player.clone(), game.id);
    view.mount_handle().unmount();
    view.load().await.unwrap();
    assert!(view.game.is_none());
    assert_eq!(view.join_action(), None);

    let mut hosted = HostedGameView::new(host.clone(), game.id);
    hosted.mount_handle().unmount();
    hosted.load().await.unwrap();
    assert!(hosted.game.is_none());
    assert!(hosted.requests.is_empty());
}

#[tokio::test]
async fn test_missing_host_still_renders_game() {
    let store = Arc::new(MemoryStore::new());
    let base_url = spawn_app_with(store.clone());
    let (player, _) = signed_in(&base_url, "player").await;

    // No user 4242 exists, so the host lookup answers 404
    let game = store
        .create_game(4242, new_game(2, 10, Visibility::Public))
        .await
        .unwrap();

    let mut view = GameDetailView::new(player.clone(), game.id);
    view.load().await.expect("page loads without its host");
    assert_eq!(view.host, HostInfo::Unknown);
    assert_eq!(view.game.as_ref().map(|g| g.host_id), Some(4242));
    assert_eq!(view.join_status, Some(JoinStatus::NotRequested));
    assert_eq!(view.join_action(), Some(JoinAction::RequestToJoin));
    assert!(view.last_error.is_none());
}

#[tokio::test]
async fn test_unmounted_view_keeps_no_error() {
    let base_url = spawn_app();
    let (player, _) = signed_in(&base_url, "player").await;

    let mut mounted = GameDetailView::new(player.clone(), 9999);
    let err = mounted.request_to_join().await.unwrap_err();
    assert!(matches!(err, PlayError::NotFound(_)), "got {:?}", err);
    assert!(mounted.last_error.is_some());

    let mut view = GameDetailView::new(player.clone(), 9999);
    view.mount_handle().unmount();
    let err = view.request_to_join().await.unwrap_err();
    assert!(matches!(err, PlayError::NotFound(_)), "got {:?}", err);
    assert!(view.last_error.is_none());

    let mut hosted = HostedGameView::new(player.clone(), 9999);
    hosted.mount_handle().unmount();
    assert!(hosted.decide(9999, Decision::Accepted).await.is_err());
    assert!(hosted.cancel_game().await.is_err());
    assert!(hosted.last_error.is_none());
}
