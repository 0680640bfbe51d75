use log::{info, warn};

use crate::errors::GameError;
use crate::models::{GameId, Move, ServerMessage, NO_GAME};
use crate::session::JoinOutcome;
use crate::websocket::handler::GameSocket;

// Each handler returns the envelope owed to this connection, if any. Game
// updates reach both players through the lobby instead.
impl GameSocket {
    /// The username an envelope acts for. It must be the token's user; an
    /// empty one means the token's user.
    pub fn resolve_username(&self, claimed: &str) -> Result<String, GameError> {
        let username = &self.identity.username;
        if claimed.is_empty() || claimed == username {
            Ok(username.clone())
        } else {
            Err(GameError::Auth(format!(
                "connection belongs to {}, not {}",
                username, claimed
            )))
        }
    }

    fn error_reply(&self, game_id: GameId, error: &GameError) -> Option<ServerMessage> {
        warn!("Connection {} ({}): {}", self.id, self.identity.username, error);
        Some(ServerMessage::error(&self.identity.username, game_id, error))
    }

    pub fn handle_join_queue(&self, claimed: &str) -> Option<ServerMessage> {
        let result = self
            .resolve_username(claimed)
            .and_then(|username| self.app_state.lobby.join_queue(&username, self.id));

        match result {
            Ok(JoinOutcome::Waiting) => {
                info!("{} is waiting for an opponent", self.identity.username);
                None
            }
            Ok(JoinOutcome::Paired(game)) => {
                info!(
                    "Game {} created: {} (X) vs {} (O)",
                    game.id, game.player_x, game.player_o
                );
                None
            }
            Err(e) => self.error_reply(NO_GAME, &e),
        }
    }

    pub fn handle_leave_queue(&self, claimed: &str) -> Option<ServerMessage> {
        match self.resolve_username(claimed) {
            Ok(username) => {
                self.app_state.lobby.leave_queue(&username);
                None
            }
            Err(e) => self.error_reply(NO_GAME, &e),
        }
    }

    /// Rule violations go back to this connection only; the other player
    /// hears nothing until a move succeeds.
    pub fn handle_move(&self, mut mv: Move) -> Option<ServerMessage> {
        let game_id = mv.game_id;
        let result = self.resolve_username(&mv.username).and_then(|username| {
            mv.username = username;
            self.app_state.lobby.submit_move(&mv, self.id)
        });

        match result {
            Ok(_) => None,
            Err(e) => self.error_reply(game_id, &e),
        }
    }

    pub fn handle_ping(&self) -> Option<ServerMessage> {
        Some(ServerMessage::pong())
    }
}
