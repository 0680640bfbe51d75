use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::errors::GameError;
use crate::game::rules::{cell_index, check_victory, Victory};
use crate::models::{GameId, GameSnapshot, GameStatus, Move};
use crate::storage::GameStore;

/// One lock per game, so moves of the same game are serialized while
/// different games proceed in parallel.
///
/// An entry lives only while some caller holds or waits on it.
#[derive(Default)]
pub struct GameLocks {
    locks: Mutex<HashMap<GameId, Arc<Mutex<()>>>>,
}

impl GameLocks {
    pub fn for_game(&self, game_id: GameId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(game_id).or_default().clone()
    }

    /// Hands back a lock taken with `for_game`, dropping the entry when no
    /// other caller holds it.
    pub fn release(&self, game_id: GameId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // one reference in the table, one in `lock`
        let unshared = locks
            .get(&game_id)
            .is_some_and(|entry| Arc::ptr_eq(entry, &lock) && Arc::strong_count(&lock) == 2);
        if unshared {
            locks.remove(&game_id);
        }
    }

    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Result of an accepted move.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub snapshot: GameSnapshot,
    pub player_x: String,
    pub player_o: String,
    pub victory: Option<Victory>,
}

impl MoveOutcome {
    pub fn players(&self) -> [&str; 2] {
        [&self.player_x, &self.player_o]
    }

    pub fn is_terminated(&self) -> bool {
        self.snapshot.status.is_terminated()
    }
}

/// Turn state machine: Started -> InProgress -> Terminated.
pub struct GameEngine {
    store: Arc<dyn GameStore>,
    locks: GameLocks,
}

impl GameEngine {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self {
            store,
            locks: GameLocks::default(),
        }
    }

    pub fn snapshot(&self, game_id: GameId) -> Result<GameSnapshot, GameError> {
        let game = self.store.load_game(game_id)?;
        let board = self.store.load_board(game_id)?;
        Ok(GameSnapshot {
            id: game.id,
            board,
            turn: game.turn,
            status: game.status,
        })
    }

    /// Validates and applies a move, then persists the new turn and status.
    ///
    /// A rejected move leaves storage untouched.
    pub fn apply_move(&self, mv: &Move) -> Result<MoveOutcome, GameError> {
        let lock = self.locks.for_game(mv.game_id);
        let guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let result = self.apply_locked(mv);
        drop(guard);
        self.locks.release(mv.game_id, lock);
        result
    }

    fn apply_locked(&self, mv: &Move) -> Result<MoveOutcome, GameError> {
        let game = self.store.load_game(mv.game_id)?;
        if game.status.is_terminated() {
            return Err(GameError::GameOver(game.id));
        }

        let mark = game.mark_of(&mv.username).ok_or_else(|| GameError::NotAParticipant {
            username: mv.username.clone(),
            game_id: game.id,
        })?;
        if mark != game.turn {
            return Err(GameError::TurnViolation {
                username: mv.username.clone(),
                turn: game.turn,
            });
        }

        let (x, y) = cell_index(mv.x, mv.y).ok_or(GameError::OutOfBounds { x: mv.x, y: mv.y })?;
        if self.store.load_board(game.id)?.get(x, y).is_some() {
            return Err(GameError::OccupiedCell { x, y });
        }

        self.store.append_move(game.id, mark, x, y)?;
        let board = self.store.load_board(game.id)?;
        let victory = check_victory(&board);

        let (turn, status) = match victory {
            Some(win) => {
                info!("Game {} won by {} ({:?})", game.id, win.mark, win.line);
                self.store.update_game_status(game.id, GameStatus::Terminated)?;
                (game.turn, GameStatus::Terminated)
            }
            None => {
                let next = game.turn.other();
                self.store.update_game_turn(game.id, next)?;
                self.store.update_game_status(game.id, GameStatus::InProgress)?;
                if board.is_full() {
                    // Draws are not a terminal outcome.
                    info!("Game {} has a full board and no winner", game.id);
                }
                (next, GameStatus::InProgress)
            }
        };
        debug!("Game {}: {} played ({}, {}), turn now {}", game.id, mv.username, x, y, turn);

        Ok(MoveOutcome {
            snapshot: GameSnapshot {
                id: game.id,
                board,
                turn,
                status,
            },
            player_x: game.player_x,
            player_o: game.player_o,
            victory,
        })
    }
}
