use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

// Custom Errors used in handlers and stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomError {
    BadRequest,
    InternalServerError,
    InvalidToken,
    WrongPassword,
    UserNotFound,
    UserExists,
    MissingUserFields,
    GameNotFound,
    MissingGameFields,
    InvalidPlayerCounts,
    JoinRequestNotFound,
    InvalidDecision,
    NotHost,
    HostCannotJoin,
    AlreadyRequested,
    AlreadyDecided,
    GameNotOpen,
    GameFull,
    AlreadyCancelled,
}

impl CustomError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest
            | Self::MissingUserFields
            | Self::MissingGameFields
            | Self::InvalidPlayerCounts
            | Self::InvalidDecision => StatusCode::BAD_REQUEST,
            Self::InvalidToken | Self::WrongPassword => StatusCode::UNAUTHORIZED,
            Self::NotHost | Self::HostCannotJoin => StatusCode::FORBIDDEN,
            Self::UserNotFound | Self::GameNotFound | Self::JoinRequestNotFound => StatusCode::NOT_FOUND,
            Self::UserExists
            | Self::AlreadyRequested
            | Self::AlreadyDecided
            | Self::GameNotOpen
            | Self::GameFull
            | Self::AlreadyCancelled => StatusCode::CONFLICT,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::InternalServerError => "Internal Server Error",
            Self::BadRequest => "Bad Request",
            Self::InvalidToken => "Token is not valid",
            Self::WrongPassword => "Wrong Password",
            Self::UserNotFound => "User not Found",
            Self::UserExists => "User already exists",
            Self::MissingUserFields => "Name, password, display name and email are required",
            Self::GameNotFound => "Game not found",
            Self::MissingGameFields => "Title and location are required",
            Self::InvalidPlayerCounts => "Player counts must be at least 1 and current players may not exceed needed players",
            Self::JoinRequestNotFound => "Join request not found",
            Self::InvalidDecision => "Invalid status. Must be 'accepted' or 'rejected'",
            Self::NotHost => "Only the host can do this for the game",
            Self::HostCannotJoin => "The host cannot request to join their own game",
            Self::AlreadyRequested => "Join request already exists",
            Self::AlreadyDecided => "Join request has already been decided",
            Self::GameNotOpen => "Game is not open",
            Self::GameFull => "Game has no remaining slots",
            Self::AlreadyCancelled => "Game is already cancelled",
        }
    }
}

//implementation of custom errors that are used in handlers
impl IntoResponse for CustomError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(json!({"error": self.message()}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_errors_are_conflicts() {
        for err in [
            CustomError::AlreadyRequested,
            CustomError::AlreadyDecided,
            CustomError::GameNotOpen,
            CustomError::GameFull,
        ] {
            assert_eq!(err.status_code(), StatusCode::CONFLICT, "{:?}", err);
        }
    }

    #[test]
    fn test_permission_errors_are_forbidden() {
        assert_eq!(CustomError::NotHost.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(CustomError::HostCannotJoin.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_error_body_carries_message() {
        let response = CustomError::GameFull.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
