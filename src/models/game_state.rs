use serde::ser::{Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Opaque game identifier issued by storage. Valid ids are positive.
pub type GameId = i64;

/// Opaque identifier issued to a WebSocket connection when it is accepted.
pub type ConnectionId = Uuid;

/// Wire sentinel for "no game".
pub const NO_GAME: GameId = -1;

/// Side length of the board.
pub const BOARD_SIZE: usize = 3;

/// A player's symbol on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn other(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mark::X => "X",
            Mark::O => "O",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Mark {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Lifecycle of a game. Serialized as its numeric code (0, 1, 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Started = 0,
    InProgress = 1,
    Terminated = 2,
}

impl GameStatus {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_terminated(self) -> bool {
        self == GameStatus::Terminated
    }
}

impl Serialize for GameStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// 3x3 grid, indexed `[row][column]`.
///
/// Never stored as mutable state: it is always rebuilt from the move log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board {
    cells: [[Option<Mark>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a board from row strings such as `["XXX", "OO.", "..."]`.
    /// Any character other than `X` or `O` is an empty cell.
    pub fn from_rows(rows: [&str; BOARD_SIZE]) -> Self {
        let mut board = Board::empty();
        for (x, row) in rows.iter().enumerate() {
            for (y, c) in row.chars().take(BOARD_SIZE).enumerate() {
                board.cells[x][y] = match c {
                    'X' => Some(Mark::X),
                    'O' => Some(Mark::O),
                    _ => None,
                };
            }
        }
        board
    }

    /// Replays a move log in order. Later moves overwrite earlier ones on the
    /// same cell; out-of-range entries are ignored.
    pub fn replay<'a, I>(moves: I) -> Self
    where
        I: IntoIterator<Item = &'a MoveRecord>,
    {
        let mut board = Board::empty();
        for record in moves {
            if record.x < BOARD_SIZE && record.y < BOARD_SIZE {
                board.cells[record.x][record.y] = Some(record.mark);
            }
        }
        board
    }

    pub fn get(&self, x: usize, y: usize) -> Option<Mark> {
        self.cells.get(x).and_then(|row| row.get(y)).copied().flatten()
    }

    pub fn rows(&self) -> &[[Option<Mark>; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().flatten().all(Option::is_some)
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rows = self
            .cells
            .map(|row| row.map(|cell| cell.map_or("", Mark::as_str)));
        rows.serialize(serializer)
    }
}

/// One entry of the append-only move log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    pub mark: Mark,
    pub x: usize,
    pub y: usize,
}

/// A game row as kept by storage (everything except the board).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub id: GameId,
    pub player_x: String,
    pub player_o: String,
    pub turn: Mark,
    pub status: GameStatus,
}

impl GameRecord {
    pub fn mark_of(&self, username: &str) -> Option<Mark> {
        if self.player_x == username {
            Some(Mark::X)
        } else if self.player_o == username {
            Some(Mark::O)
        } else {
            None
        }
    }

    pub fn players(&self) -> [&str; 2] {
        [&self.player_x, &self.player_o]
    }
}

/// A move request: `x` is the row, `y` the column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub game_id: GameId,
    pub username: String,
    pub x: i64,
    pub y: i64,
}

/// The state pushed to clients after each move.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GameSnapshot {
    pub id: GameId,
    pub board: Board,
    pub turn: Mark,
    pub status: GameStatus,
}
