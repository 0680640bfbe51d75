use actix::Recipient;
use log::{debug, info};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::errors::GameError;
use crate::models::{ConnectionId, GameId, ServerFrame};

/// A live connection: its id and the mailbox that writes to its socket.
#[derive(Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub outbox: Recipient<ServerFrame>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").field("id", &self.id).finish()
    }
}

/// Per-username bookkeeping of connections and their game bindings.
///
/// `bindings` and `games` are inverse maps: a connection bound to a game
/// appears in both, and in at most one game.
#[derive(Default)]
struct SessionRecord {
    connections: Vec<Connection>,
    bindings: HashMap<ConnectionId, GameId>,
    games: HashMap<GameId, ConnectionId>,
}

impl SessionRecord {
    fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    fn is_unbound(&self, id: ConnectionId) -> bool {
        !self.bindings.contains_key(&id)
    }

    fn unbound_count(&self) -> usize {
        self.connections
            .iter()
            .filter(|c| self.is_unbound(c.id))
            .count()
    }

    /// Binds without checks; an older connection on the same game is freed.
    fn attach(&mut self, username: &str, id: ConnectionId, game_id: GameId) {
        if let Some(previous) = self.games.insert(game_id, id) {
            self.bindings.remove(&previous);
            debug!("Connection {} of {} released from game {}", previous, username, game_id);
        }
        self.bindings.insert(id, game_id);
        debug!("Connection {} of {} bound to game {}", id, username, game_id);
    }

    fn clear_binding(&mut self, id: ConnectionId) -> Option<GameId> {
        let game_id = self.bindings.remove(&id)?;
        if self.games.get(&game_id) == Some(&id) {
            self.games.remove(&game_id);
        }
        Some(game_id)
    }
}

#[derive(Default)]
struct Tables {
    sessions: HashMap<String, SessionRecord>,
    owners: HashMap<ConnectionId, String>,
}

/// What was left behind when a connection closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub username: String,
    pub game_id: Option<GameId>,
    pub idle_connections_left: usize,
}

/// Tracks every live connection per user and which game each one plays.
#[derive(Default)]
pub struct ConnectionRegistry {
    tables: Mutex<Tables>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds an unbound connection, creating the user's record if needed.
    pub fn register(&self, username: &str, connection: Connection) {
        let mut tables = self.tables();
        if let Some(owner) = tables.owners.get(&connection.id).cloned() {
            if owner == username {
                return;
            }
            if let Some(previous) = tables.sessions.get_mut(&owner) {
                previous.connections.retain(|c| c.id != connection.id);
                previous.clear_binding(connection.id);
            }
        }
        tables.owners.insert(connection.id, username.to_string());
        let record = tables.sessions.entry(username.to_string()).or_default();
        info!(
            "Registered connection {} for {} ({} live)",
            connection.id,
            username,
            record.connections.len() + 1
        );
        record.connections.push(connection);
    }

    /// Binds a connection to a game.
    ///
    /// If the user already had another connection on this game, that one is
    /// freed. A connection already playing a different game is refused.
    pub fn bind(&self, username: &str, connection_id: ConnectionId, game_id: GameId) -> Result<(), GameError> {
        let mut tables = self.tables();
        let record = tables
            .sessions
            .get_mut(username)
            .filter(|record| record.connection(connection_id).is_some())
            .ok_or(GameError::UnknownConnection(connection_id))?;

        match record.bindings.get(&connection_id) {
            Some(&bound) if bound == game_id => return Ok(()),
            Some(&bound) => return Err(GameError::AlreadyInGame(bound)),
            None => {}
        }

        record.attach(username, connection_id, game_id);
        Ok(())
    }

    /// Binds a new game's two players in one step: the caller's connection
    /// and the first idle connection of `opponent`. Either both are bound or
    /// neither is.
    ///
    /// Returns the opponent's connection, then the caller's.
    pub fn bind_pair(
        &self,
        game_id: GameId,
        opponent: &str,
        caller: &str,
        caller_connection: ConnectionId,
    ) -> Result<(Connection, Connection), GameError> {
        let mut tables = self.tables();

        let caller_record = tables
            .sessions
            .get(caller)
            .ok_or(GameError::UnknownConnection(caller_connection))?;
        let caller_conn = caller_record
            .connection(caller_connection)
            .cloned()
            .ok_or(GameError::UnknownConnection(caller_connection))?;
        if let Some(&bound) = caller_record.bindings.get(&caller_connection) {
            return Err(GameError::AlreadyInGame(bound));
        }

        let opponent_conn = tables
            .sessions
            .get(opponent)
            .and_then(|record| {
                record
                    .connections
                    .iter()
                    .find(|c| record.is_unbound(c.id))
                    .cloned()
            })
            .ok_or_else(|| GameError::NoIdleConnection(opponent.to_string()))?;

        for (username, connection_id) in [(opponent, opponent_conn.id), (caller, caller_conn.id)] {
            if let Some(record) = tables.sessions.get_mut(username) {
                record.attach(username, connection_id, game_id);
            }
        }
        Ok((opponent_conn, caller_conn))
    }

    /// Frees the user's connection on a game. Returns the connection that was bound.
    pub fn unbind(&self, username: &str, game_id: GameId) -> Option<ConnectionId> {
        let mut tables = self.tables();
        let record = tables.sessions.get_mut(username)?;
        let connection_id = record.games.remove(&game_id)?;
        record.bindings.remove(&connection_id);
        debug!("Connection {} of {} unbound from game {}", connection_id, username, game_id);
        Some(connection_id)
    }

    /// The user's connection bound to `game_id`.
    pub fn bound_connection(&self, username: &str, game_id: GameId) -> Result<Connection, GameError> {
        let tables = self.tables();
        tables
            .sessions
            .get(username)
            .and_then(|record| {
                let id = record.games.get(&game_id)?;
                record.connection(*id).cloned()
            })
            .ok_or_else(|| GameError::UnresolvedRecipient {
                username: username.to_string(),
                game_id,
            })
    }

    /// Resolves each participant's connection on `game_id`, skipping those
    /// with none.
    pub fn connections_for(&self, game_id: GameId, participants: &[&str]) -> Vec<(String, Connection)> {
        participants
            .iter()
            .filter_map(|username| match self.bound_connection(username, game_id) {
                Ok(connection) => Some((username.to_string(), connection)),
                Err(e) => {
                    debug!("Skipping recipient: {}", e);
                    None
                }
            })
            .collect()
    }

    /// First connection of the user not bound to any game.
    pub fn find_unbound_connection(&self, username: &str) -> Result<Connection, GameError> {
        let tables = self.tables();
        tables
            .sessions
            .get(username)
            .and_then(|record| {
                record
                    .connections
                    .iter()
                    .find(|c| record.is_unbound(c.id))
                    .cloned()
            })
            .ok_or_else(|| GameError::NoIdleConnection(username.to_string()))
    }

    /// A registered connection of the user, bound or not.
    pub fn connection(&self, username: &str, connection_id: ConnectionId) -> Result<Connection, GameError> {
        let tables = self.tables();
        tables
            .sessions
            .get(username)
            .and_then(|record| record.connection(connection_id).cloned())
            .ok_or(GameError::UnknownConnection(connection_id))
    }

    /// The game a connection is bound to, if any.
    pub fn game_of(&self, connection_id: ConnectionId) -> Option<GameId> {
        let tables = self.tables();
        let owner = tables.owners.get(&connection_id)?;
        tables.sessions.get(owner)?.bindings.get(&connection_id).copied()
    }

    /// Purges a closed connection from its owner's record.
    pub fn remove_connection(&self, connection_id: ConnectionId) -> Option<Departure> {
        let mut tables = self.tables();
        let username = tables.owners.remove(&connection_id)?;
        let record = tables.sessions.get_mut(&username)?;
        record.connections.retain(|c| c.id != connection_id);
        let game_id = record.clear_binding(connection_id);
        let departure = Departure {
            idle_connections_left: record.unbound_count(),
            username,
            game_id,
        };
        info!(
            "Removed connection {} of {} (game: {:?})",
            connection_id, departure.username, departure.game_id
        );
        Some(departure)
    }

    pub fn live_connections(&self) -> usize {
        self.tables().owners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Recorder;

    #[actix_rt::test]
    async fn registered_connections_start_unbound() {
        let registry = ConnectionRegistry::new();
        let (_rx, conn) = Recorder::connection();
        registry.register("alice", conn.clone());
        registry.register("alice", conn.clone());

        assert_eq!(registry.live_connections(), 1);
        assert_eq!(registry.find_unbound_connection("alice").unwrap().id, conn.id);
        assert_eq!(registry.game_of(conn.id), None);
        assert!(matches!(
            registry.find_unbound_connection("bob"),
            Err(GameError::NoIdleConnection(_))
        ));
    }

    #[actix_rt::test]
    async fn bind_and_unbind_keep_both_maps_consistent() {
        let registry = ConnectionRegistry::new();
        let (_rx, conn) = Recorder::connection();
        registry.register("alice", conn.clone());

        registry.bind("alice", conn.id, 7).unwrap();
        assert_eq!(registry.game_of(conn.id), Some(7));
        assert_eq!(registry.bound_connection("alice", 7).unwrap().id, conn.id);
        assert!(registry.find_unbound_connection("alice").is_err());
        assert_eq!(
            registry.bind("alice", conn.id, 8),
            Err(GameError::AlreadyInGame(7))
        );

        assert_eq!(registry.unbind("alice", 7), Some(conn.id));
        assert_eq!(registry.game_of(conn.id), None);
        assert!(registry.bound_connection("alice", 7).is_err());
        assert_eq!(registry.find_unbound_connection("alice").unwrap().id, conn.id);
        assert_eq!(registry.unbind("alice", 7), None);
    }

    #[actix_rt::test]
    async fn one_user_can_wait_and_play_on_separate_connections() {
        let registry = ConnectionRegistry::new();
        let (_p1, playing) = Recorder::connection();
        let (_p2, waiting) = Recorder::connection();
        registry.register("alice", playing.clone());
        registry.register("alice", waiting.clone());

        registry.bind("alice", playing.id, 1).unwrap();
        assert_eq!(registry.find_unbound_connection("alice").unwrap().id, waiting.id);

        registry.bind("alice", waiting.id, 2).unwrap();
        assert_eq!(registry.bound_connection("alice", 1).unwrap().id, playing.id);
        assert_eq!(registry.bound_connection("alice", 2).unwrap().id, waiting.id);
    }

    #[actix_rt::test]
    async fn rebinding_a_game_frees_the_older_connection() {
        let registry = ConnectionRegistry::new();
        let (_p1, old) = Recorder::connection();
        let (_p2, new) = Recorder::connection();
        registry.register("bob", old.clone());
        registry.register("bob", new.clone());

        registry.bind("bob", old.id, 3).unwrap();
        registry.bind("bob", new.id, 3).unwrap();
        assert_eq!(registry.bound_connection("bob", 3).unwrap().id, new.id);
        assert_eq!(registry.game_of(old.id), None);
    }

    #[actix_rt::test]
    async fn missing_participants_are_skipped() {
        let registry = ConnectionRegistry::new();
        let (_p1, alice) = Recorder::connection();
        let (_p2, bob) = Recorder::connection();
        registry.register("alice", alice.clone());
        registry.register("bob", bob.clone());
        registry.bind("alice", alice.id, 5).unwrap();

        let resolved = registry.connections_for(5, &["alice", "bob"]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].0, "alice");
        assert!(matches!(
            registry.bound_connection("bob", 5),
            Err(GameError::UnresolvedRecipient { .. })
        ));
    }

    #[actix_rt::test]
    async fn closing_a_connection_purges_only_its_entries() {
        let registry = ConnectionRegistry::new();
        let (_p1, alice) = Recorder::connection();
        let (_p2, bob) = Recorder::connection();
        let (_p3, alice_idle) = Recorder::connection();
        registry.register("alice", alice.clone());
        registry.register("alice", alice_idle.clone());
        registry.register("bob", bob.clone());
        registry.bind("alice", alice.id, 9).unwrap();
        registry.bind("bob", bob.id, 9).unwrap();

        let departure = registry.remove_connection(alice.id).unwrap();
        assert_eq!(
            departure,
            Departure {
                username: "alice".into(),
                game_id: Some(9),
                idle_connections_left: 1,
            }
        );
        assert!(registry.bound_connection("alice", 9).is_err());
        assert_eq!(registry.bound_connection("bob", 9).unwrap().id, bob.id);
        assert_eq!(registry.remove_connection(alice.id), None);
        assert_eq!(registry.live_connections(), 2);
    }

    #[actix_rt::test]
    async fn pair_binding_is_all_or_nothing() {
        let registry = ConnectionRegistry::new();
        let (_p1, alice) = Recorder::connection();
        let (_p2, bob) = Recorder::connection();
        registry.register("alice", alice.clone());
        registry.register("bob", bob.clone());

        registry.bind("alice", alice.id, 1).unwrap();
        assert_eq!(
            registry.bind_pair(2, "alice", "bob", bob.id).unwrap_err(),
            GameError::NoIdleConnection("alice".into())
        );
        assert_eq!(registry.game_of(bob.id), None);

        registry.unbind("alice", 1);
        registry.bind("bob", bob.id, 1).unwrap();
        assert_eq!(
            registry.bind_pair(2, "alice", "bob", bob.id).unwrap_err(),
            GameError::AlreadyInGame(1)
        );
        assert_eq!(registry.game_of(alice.id), None);

        registry.unbind("bob", 1);
        let (x, o) = registry.bind_pair(2, "alice", "bob", bob.id).unwrap();
        assert_eq!((x.id, o.id), (alice.id, bob.id));
        assert_eq!(registry.game_of(alice.id), Some(2));
        assert_eq!(registry.game_of(bob.id), Some(2));
    }

    #[actix_rt::test]
    async fn binding_an_unknown_connection_fails() {
        let registry = ConnectionRegistry::new();
        let (_rx, conn) = Recorder::connection();
        assert_eq!(
            registry.bind("alice", conn.id, 1),
            Err(GameError::UnknownConnection(conn.id))
        );
    }
}
