pub mod game;
pub mod join_request;
pub mod user;
