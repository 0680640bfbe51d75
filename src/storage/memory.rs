use log::debug;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::errors::StorageError;
use crate::models::{GameId, GameRecord, GameStatus, Mark, MoveRecord};
use crate::storage::GameStore;

#[derive(Default)]
struct Tables {
    last_id: GameId,
    games: HashMap<GameId, GameRecord>,
    moves: HashMap<GameId, Vec<MoveRecord>>,
}

/// Process-local store. Ids start at 1.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Tables {
    fn game_mut(&mut self, game_id: GameId) -> Result<&mut GameRecord, StorageError> {
        self.games
            .get_mut(&game_id)
            .ok_or(StorageError::GameNotFound(game_id))
    }
}

impl GameStore for MemoryStore {
    fn create_game(&self, player_x: &str, player_o: &str) -> Result<GameRecord, StorageError> {
        let mut tables = self.tables();
        tables.last_id += 1;
        let record = GameRecord {
            id: tables.last_id,
            player_x: player_x.to_string(),
            player_o: player_o.to_string(),
            turn: Mark::X,
            status: GameStatus::Started,
        };
        tables.games.insert(record.id, record.clone());
        tables.moves.insert(record.id, Vec::new());
        debug!("Stored game {}: {} (X) vs {} (O)", record.id, player_x, player_o);
        Ok(record)
    }

    fn load_game(&self, game_id: GameId) -> Result<GameRecord, StorageError> {
        self.tables()
            .games
            .get(&game_id)
            .cloned()
            .ok_or(StorageError::GameNotFound(game_id))
    }

    fn append_move(&self, game_id: GameId, mark: Mark, x: usize, y: usize) -> Result<(), StorageError> {
        let mut tables = self.tables();
        let log = tables
            .moves
            .get_mut(&game_id)
            .ok_or(StorageError::GameNotFound(game_id))?;
        log.push(MoveRecord { mark, x, y });
        Ok(())
    }

    fn load_moves(&self, game_id: GameId) -> Result<Vec<MoveRecord>, StorageError> {
        self.tables()
            .moves
            .get(&game_id)
            .cloned()
            .ok_or(StorageError::GameNotFound(game_id))
    }

    fn update_game_status(&self, game_id: GameId, status: GameStatus) -> Result<(), StorageError> {
        self.tables().game_mut(game_id)?.status = status;
        Ok(())
    }

    fn update_game_turn(&self, game_id: GameId, turn: Mark) -> Result<(), StorageError> {
        self.tables().game_mut(game_id)?.turn = turn;
        Ok(())
    }

    fn games_for_player(&self, username: &str) -> Result<Vec<GameRecord>, StorageError> {
        let tables = self.tables();
        let mut games: Vec<GameRecord> = tables
            .games
            .values()
            .filter(|game| game.mark_of(username).is_some())
            .cloned()
            .collect();
        games.sort_by_key(|game| game.id);
        Ok(games)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Board;

    #[test]
    fn creates_games_with_increasing_ids() {
        let store = MemoryStore::new();
        let first = store.create_game("alice", "bob").unwrap();
        let second = store.create_game("carol", "alice").unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.turn, Mark::X);
        assert_eq!(first.status, GameStatus::Started);
        assert_eq!(store.load_board(first.id).unwrap(), Board::empty());

        let ids: Vec<GameId> = store
            .games_for_player("alice")
            .unwrap()
            .iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn board_is_replayed_from_the_move_log() {
        let store = MemoryStore::new();
        let game = store.create_game("alice", "bob").unwrap();
        store.append_move(game.id, Mark::X, 0, 0).unwrap();
        store.append_move(game.id, Mark::O, 2, 1).unwrap();

        let first = store.load_board(game.id).unwrap();
        let second = store.load_board(game.id).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Board::from_rows(["X..", "...", ".O."]));
    }

    #[test]
    fn unknown_games_are_reported() {
        let store = MemoryStore::new();
        assert_eq!(store.load_game(9), Err(StorageError::GameNotFound(9)));
        assert_eq!(
            store.append_move(9, Mark::X, 0, 0),
            Err(StorageError::GameNotFound(9))
        );
        assert_eq!(
            store.update_game_status(9, GameStatus::Terminated),
            Err(StorageError::GameNotFound(9))
        );
    }

    #[test]
    fn status_and_turn_updates_persist() {
        let store = MemoryStore::new();
        let game = store.create_game("alice", "bob").unwrap();
        store.update_game_turn(game.id, Mark::O).unwrap();
        store.update_game_status(game.id, GameStatus::InProgress).unwrap();
        let loaded = store.load_game(game.id).unwrap();
        assert_eq!(loaded.turn, Mark::O);
        assert_eq!(loaded.status, GameStatus::InProgress);
    }
}
