use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::{ConnectionId, GameId, Mark};

/// Failures of the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("game {0} not found")]
    GameNotFound(GameId),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Everything that can go wrong while serving a single request or frame.
///
/// None of these are retried; each one is terminal for the message that
/// triggered it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("malformed message: {0}")]
    Protocol(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("it's not your turn: {username} cannot play {turn}")]
    TurnViolation { username: String, turn: Mark },

    #[error("cell ({x}, {y}) is already occupied")]
    OccupiedCell { x: usize, y: usize },

    #[error("cell ({x}, {y}) is outside the board")]
    OutOfBounds { x: i64, y: i64 },

    #[error("game {0} is already over")]
    GameOver(GameId),

    #[error("{username} is not a player in game {game_id}")]
    NotAParticipant { username: String, game_id: GameId },

    #[error("connection is already playing game {0}")]
    AlreadyInGame(GameId),

    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    #[error("{0} has no idle connection")]
    NoIdleConnection(String),

    #[error("{username} has no connection bound to game {game_id}")]
    UnresolvedRecipient { username: String, game_id: GameId },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ResponseError for GameError {
    fn status_code(&self) -> StatusCode {
        match self {
            GameError::Auth(_) => StatusCode::UNAUTHORIZED,
            GameError::Storage(StorageError::GameNotFound(_)) => StatusCode::NOT_FOUND,
            GameError::Storage(StorageError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            GameError::TurnViolation { .. } | GameError::NotAParticipant { .. } => {
                StatusCode::FORBIDDEN
            }
            GameError::OccupiedCell { .. }
            | GameError::GameOver(_)
            | GameError::AlreadyInGame(_) => StatusCode::CONFLICT,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}
