use actix::Message;
use serde::{Deserialize, Serialize};

use crate::models::{GameId, GameSnapshot, Mark, NO_GAME};

/// Message sent from client to server.
///
/// Every field is optional on the wire; which ones matter depends on `type`.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub message: String,
    pub username: String,
    #[serde(rename = "gameId", default = "no_game")]
    pub game_id: GameId,
    pub x: i64,
    pub y: i64,
}

fn no_game() -> GameId {
    NO_GAME
}

/// Message sent from server to client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub message: String,
    pub username: String,
    #[serde(rename = "gameId")]
    pub game_id: GameId,
}

impl ServerMessage {
    fn new(message_type: &str, message: impl Into<String>, username: &str, game_id: GameId) -> Self {
        Self {
            message_type: message_type.to_string(),
            message: message.into(),
            username: username.to_string(),
            game_id,
        }
    }

    pub fn waiting(notice: &str) -> Self {
        Self::new("waiting", notice, "", NO_GAME)
    }

    /// Announces a new game; `message` carries the mark assigned to the recipient.
    pub fn game_created(username: &str, game_id: GameId, mark: Mark) -> Self {
        Self::new("gameCreated", mark.as_str(), username, game_id)
    }

    /// Carries the snapshot as a JSON string, as clients expect.
    pub fn game_update(username: &str, snapshot: &GameSnapshot) -> Result<Self, serde_json::Error> {
        let payload = serde_json::to_string(snapshot)?;
        Ok(Self::new("move", payload, username, snapshot.id))
    }

    pub fn pong() -> Self {
        Self::new("message", "pong", "", NO_GAME)
    }

    pub fn error(username: &str, game_id: GameId, error: impl ToString) -> Self {
        Self::new("error", error.to_string(), username, game_id)
    }
}

/// Delivers one envelope to a connection's mailbox.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct ServerFrame(pub ServerMessage);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Board, GameStatus};

    #[test]
    fn missing_fields_take_defaults() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert_eq!(msg.message_type, "ping");
        assert_eq!(msg.game_id, NO_GAME);
        assert!(msg.username.is_empty());
    }

    #[test]
    fn game_update_embeds_snapshot_as_string() {
        let snapshot = GameSnapshot {
            id: 3,
            board: Board::from_rows(["X..", "...", "..."]),
            turn: Mark::O,
            status: GameStatus::InProgress,
        };
        let envelope = ServerMessage::game_update("bob", &snapshot).unwrap();
        assert_eq!(envelope.message_type, "move");
        assert_eq!(envelope.game_id, 3);

        let payload: serde_json::Value = serde_json::from_str(&envelope.message).unwrap();
        assert_eq!(payload["board"][0][0], "X");
        assert_eq!(payload["turn"], "O");
        assert_eq!(payload["status"], 1);
    }

    #[test]
    fn outbound_uses_camel_case_game_id() {
        let text = serde_json::to_string(&ServerMessage::waiting("")).unwrap();
        assert_eq!(
            text,
            r#"{"type":"waiting","message":"","username":"","gameId":-1}"#
        );
    }
}
