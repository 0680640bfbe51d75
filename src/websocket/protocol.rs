use log::debug;

use crate::errors::GameError;
use crate::models::{ClientMessage, Move};

/// A decoded inbound envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    JoinQueue { username: String },
    LeaveQueue { username: String },
    Move(Move),
    Ping,
    /// A well-formed envelope the server has nothing to do for.
    Ignored { kind: String },
}

/// Parses one text frame.
///
/// Missing fields take their defaults, so only invalid JSON is an error.
/// A `move` without a positive `gameId` is ignored rather than rejected.
pub fn decode(text: &str) -> Result<Command, GameError> {
    let msg: ClientMessage =
        serde_json::from_str(text).map_err(|e| GameError::Protocol(e.to_string()))?;

    let command = match msg.message_type.as_str() {
        "JoinQueue" => Command::JoinQueue {
            username: msg.username,
        },
        "LeaveQueue" => Command::LeaveQueue {
            username: msg.username,
        },
        "move" if msg.game_id > 0 => Command::Move(Move {
            game_id: msg.game_id,
            username: msg.username,
            x: msg.x,
            y: msg.y,
        }),
        "ping" => Command::Ping,
        _ => {
            debug!("Ignoring {:?} envelope (gameId {})", msg.message_type, msg.game_id);
            Command::Ignored {
                kind: msg.message_type,
            }
        }
    };
    Ok(command)
}
