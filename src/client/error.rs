//! Errors surfaced to the view that triggered a call.

use reqwest::StatusCode;

/// Every failure a client call can end in. The message is meant for the user.
#[derive(Debug, thiserror::Error)]
pub enum PlayError {
    /// Game, user or join request does not exist (or is not visible to the caller).
    #[error("not found: {0}")]
    NotFound(String),

    /// Non-host deciding a request, or a host joining their own game.
    #[error("not allowed: {0}")]
    Forbidden(String),

    /// Duplicate request, deciding a decided request, joining a closed or full game.
    #[error("{0}")]
    Conflict(String),

    /// Missing or invalid input.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Missing, expired or invalid credentials.
    #[error("please sign in again: {0}")]
    Unauthorized(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a payload the boundary layer could not map.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// A mutation from the same view is still in flight.
    #[error("an action is already in progress")]
    Busy,
}

impl PlayError {
    /// Maps a non-success response onto the taxonomy.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::NOT_FOUND => PlayError::NotFound(message),
            StatusCode::FORBIDDEN => PlayError::Forbidden(message),
            StatusCode::CONFLICT => PlayError::Conflict(message),
            StatusCode::UNAUTHORIZED => PlayError::Unauthorized(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => PlayError::Validation(message),
            status if status.is_server_error() => PlayError::Server(message),
            status => PlayError::Server(format!("unexpected status {}: {}", status, message)),
        }
    }

    /// Pulls the message out of an error body. Accepts `{"error": ..}`, `{"detail": ..}`
    /// and plain text.
    pub fn message_from_body(status: StatusCode, body: &str) -> String {
        let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
        let message = parsed.as_ref().and_then(|value| {
            ["error", "detail", "message"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|m| m.as_str()))
        });
        match message {
            Some(message) => message.to_string(),
            None if !body.trim().is_empty() => body.trim().to_string(),
            None => status.canonical_reason().unwrap_or("request failed").to_string(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, PlayError::Conflict(_))
    }
}
