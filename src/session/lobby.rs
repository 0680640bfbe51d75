use log::{info, warn};
use std::sync::Arc;

use crate::errors::GameError;
use crate::game::{GameEngine, MoveOutcome};
use crate::models::{ConnectionId, GameId, GameRecord, GameSnapshot, GameStatus, Move, ServerMessage};
use crate::session::broadcast::{Broadcaster, DeliveryReport};
use crate::session::matchmaking::{MatchQueue, Pairing};
use crate::session::registry::{Connection, ConnectionRegistry};
use crate::storage::GameStore;

/// Notice sent to a user whose only possible opponent was themself.
pub const SELF_PAIR_NOTICE: &str = "Can't play with oneself";

/// What happened to a `JoinQueue` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Waiting,
    Paired(GameRecord),
}

/// The session layer: one instance per process, shared by every connection.
pub struct Lobby {
    store: Arc<dyn GameStore>,
    registry: Arc<ConnectionRegistry>,
    queue: MatchQueue,
    engine: GameEngine,
    broadcaster: Broadcaster,
}

impl Lobby {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        Self {
            engine: GameEngine::new(store.clone()),
            broadcaster: Broadcaster::new(registry.clone()),
            queue: MatchQueue::new(),
            registry,
            store,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn queue(&self) -> &MatchQueue {
        &self.queue
    }

    pub fn register(&self, username: &str, connection: Connection) {
        self.registry.register(username, connection);
    }

    /// Queues the user and pairs them if anyone else is waiting.
    ///
    /// The opponent who waited longest plays X, the caller plays O.
    pub fn join_queue(&self, username: &str, connection_id: ConnectionId) -> Result<JoinOutcome, GameError> {
        let caller = self.registry.connection(username, connection_id)?;
        if let Some(game_id) = self.registry.game_of(connection_id) {
            return Err(GameError::AlreadyInGame(game_id));
        }

        loop {
            let opponent = match self.queue.pair_next(username) {
                Pairing::Matched { opponent } => opponent,
                Pairing::Waiting { already_queued } => {
                    let notice = if already_queued { SELF_PAIR_NOTICE } else { "" };
                    Broadcaster::send(&caller, ServerMessage::waiting(notice));
                    return Ok(JoinOutcome::Waiting);
                }
            };

            if let Err(e) = self.registry.find_unbound_connection(&opponent) {
                warn!("Dropping stale queue entry: {}", e);
                continue;
            }

            let game = match self.store.create_game(&opponent, username) {
                Ok(game) => game,
                Err(e) => {
                    self.queue.restore_front(&opponent);
                    return Err(e.into());
                }
            };

            return match self.registry.bind_pair(game.id, &opponent, username, caller.id) {
                Ok((opponent_connection, caller_connection)) => {
                    self.broadcaster
                        .announce_game_created(&game, &opponent_connection, &caller_connection);
                    Ok(JoinOutcome::Paired(game))
                }
                Err(e) => {
                    self.queue.restore_front(&opponent);
                    self.abandon(game.id);
                    Err(e)
                }
            };
        }
    }

    /// Closes a game nobody could be bound to.
    fn abandon(&self, game_id: GameId) {
        warn!("Abandoning game {}: players could not be bound", game_id);
        if let Err(e) = self.store.update_game_status(game_id, GameStatus::Terminated) {
            warn!("Could not close game {}: {}", game_id, e);
        }
    }

    /// Takes the user out of the queue. Returns whether they were queued.
    pub fn leave_queue(&self, username: &str) -> bool {
        let removed = self.queue.leave(username);
        if removed > 0 {
            info!("{} left the queue", username);
        }
        removed > 0
    }

    /// Applies a move and pushes the result to both players.
    ///
    /// The submitting connection becomes the user's connection for the game
    /// if it was idle, which is how a reconnected client resumes.
    pub fn submit_move(&self, mv: &Move, connection_id: ConnectionId) -> Result<MoveOutcome, GameError> {
        self.registry.connection(&mv.username, connection_id)?;
        match self.registry.game_of(connection_id) {
            Some(bound) if bound != mv.game_id => return Err(GameError::AlreadyInGame(bound)),
            _ => {}
        }

        let outcome = self.engine.apply_move(mv)?;
        if let Err(e) = self.registry.bind(&mv.username, connection_id, mv.game_id) {
            warn!("Connection {} not adopted for game {}: {}", connection_id, mv.game_id, e);
        }

        let report = self.broadcaster.broadcast_move(&outcome);
        self.log_delivery(mv.game_id, &report);
        Ok(outcome)
    }

    fn log_delivery(&self, game_id: GameId, report: &DeliveryReport) {
        if !report.skipped.is_empty() {
            info!(
                "Game {} update not delivered to {:?}",
                game_id, report.skipped
            );
        }
    }

    pub fn snapshot(&self, game_id: GameId) -> Result<GameSnapshot, GameError> {
        self.engine.snapshot(game_id)
    }

    pub fn games_for_player(&self, username: &str) -> Result<Vec<GameRecord>, GameError> {
        Ok(self.store.games_for_player(username)?)
    }

    /// Cleans up after a closed connection. A user left without any idle
    /// connection is taken out of the queue.
    pub fn disconnect(&self, connection_id: ConnectionId) {
        if let Some(departure) = self.registry.remove_connection(connection_id) {
            if departure.idle_connections_left == 0 && self.leave_queue(&departure.username) {
                info!("{} has no idle connection left", departure.username);
            }
        }
    }
}
