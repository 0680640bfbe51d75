use log::{debug, info, warn};
use std::sync::Arc;

use crate::game::MoveOutcome;
use crate::models::{GameRecord, Mark, ServerFrame, ServerMessage};
use crate::session::registry::{Connection, ConnectionRegistry};

/// Who got a broadcast and who was skipped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: Vec<String>,
    pub skipped: Vec<String>,
}

/// Routes envelopes to the connections that should see them.
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// Queues an envelope on one connection. A closed mailbox is logged, not raised.
    pub fn send(connection: &Connection, message: ServerMessage) -> bool {
        match connection.outbox.try_send(ServerFrame(message)) {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not deliver to connection {}: {}", connection.id, e);
                false
            }
        }
    }

    /// Tells both players which game they are in and which mark they hold.
    pub fn announce_game_created(&self, game: &GameRecord, player_x: &Connection, player_o: &Connection) {
        info!(
            "Announcing game {}: {} (X) vs {} (O)",
            game.id, game.player_x, game.player_o
        );
        Self::send(
            player_x,
            ServerMessage::game_created(&game.player_x, game.id, Mark::X),
        );
        Self::send(
            player_o,
            ServerMessage::game_created(&game.player_o, game.id, Mark::O),
        );
    }

    /// Pushes the new snapshot to each participant's connection bound to the
    /// game. Each delivery is independent; a participant without a bound
    /// connection is skipped.
    ///
    /// Once a finished game has been delivered, both players are unbound so
    /// their connections can queue again.
    pub fn broadcast_move(&self, outcome: &MoveOutcome) -> DeliveryReport {
        let game_id = outcome.snapshot.id;
        let players = outcome.players();
        let recipients = self.registry.connections_for(game_id, &players);
        let mut report = DeliveryReport::default();

        for username in players {
            let connection = recipients
                .iter()
                .find(|(recipient, _)| recipient == username)
                .map(|(_, connection)| connection);
            let delivered = match connection {
                Some(connection) => match ServerMessage::game_update(username, &outcome.snapshot) {
                    Ok(envelope) => Self::send(connection, envelope),
                    Err(e) => {
                        warn!("Could not encode game {}: {}", game_id, e);
                        false
                    }
                },
                None => false,
            };
            if delivered {
                report.delivered.push(username.to_string());
            } else {
                debug!("Game {} update skipped for {}", game_id, username);
                report.skipped.push(username.to_string());
            }
        }

        if outcome.is_terminated() {
            for username in outcome.players() {
                self.registry.unbind(username, game_id);
            }
            info!("Game {} finished, players released", game_id);
        }

        report
    }
}
