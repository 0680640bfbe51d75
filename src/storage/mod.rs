//! Persistence collaborator for games and their move logs.

pub mod memory;

pub use memory::MemoryStore;

use crate::errors::StorageError;
use crate::models::{Board, GameId, GameRecord, GameStatus, Mark, MoveRecord};

/// Storage of games and moves.
///
/// The move log is append-only; the board is never stored, only replayed.
pub trait GameStore: Send + Sync {
    /// Creates a game with an empty board, turn X and status Started.
    fn create_game(&self, player_x: &str, player_o: &str) -> Result<GameRecord, StorageError>;

    fn load_game(&self, game_id: GameId) -> Result<GameRecord, StorageError>;

    fn append_move(&self, game_id: GameId, mark: Mark, x: usize, y: usize) -> Result<(), StorageError>;

    /// The move log of a game in insertion order.
    fn load_moves(&self, game_id: GameId) -> Result<Vec<MoveRecord>, StorageError>;

    fn update_game_status(&self, game_id: GameId, status: GameStatus) -> Result<(), StorageError>;

    fn update_game_turn(&self, game_id: GameId, turn: Mark) -> Result<(), StorageError>;

    /// All games the user plays in, oldest first.
    fn games_for_player(&self, username: &str) -> Result<Vec<GameRecord>, StorageError>;

    fn load_board(&self, game_id: GameId) -> Result<Board, StorageError> {
        let moves = self.load_moves(game_id)?;
        Ok(Board::replay(&moves))
    }
}
