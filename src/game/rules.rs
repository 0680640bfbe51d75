use crate::models::{Board, Mark, BOARD_SIZE};

/// A line of three cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinLine {
    Row(usize),
    Column(usize),
    MainDiagonal,
    AntiDiagonal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Victory {
    pub mark: Mark,
    pub line: WinLine,
}

fn same_mark(cells: [Option<Mark>; BOARD_SIZE]) -> Option<Mark> {
    let first = cells[0]?;
    cells.iter().all(|cell| *cell == Some(first)).then_some(first)
}

/// Looks for three identical marks in a line.
///
/// Lines are checked rows first, then columns, then the main diagonal, then
/// the anti-diagonal; the first match is the one reported.
pub fn check_victory(board: &Board) -> Option<Victory> {
    let cells = board.rows();

    for (x, row) in cells.iter().enumerate() {
        if let Some(mark) = same_mark(*row) {
            return Some(Victory { mark, line: WinLine::Row(x) });
        }
    }

    for y in 0..BOARD_SIZE {
        if let Some(mark) = same_mark([cells[0][y], cells[1][y], cells[2][y]]) {
            return Some(Victory { mark, line: WinLine::Column(y) });
        }
    }

    if let Some(mark) = same_mark([cells[0][0], cells[1][1], cells[2][2]]) {
        return Some(Victory { mark, line: WinLine::MainDiagonal });
    }

    if let Some(mark) = same_mark([cells[0][2], cells[1][1], cells[2][0]]) {
        return Some(Victory { mark, line: WinLine::AntiDiagonal });
    }

    None
}

/// Converts a wire coordinate into a board index.
pub fn cell_index(x: i64, y: i64) -> Option<(usize, usize)> {
    let x = usize::try_from(x).ok().filter(|x| *x < BOARD_SIZE)?;
    let y = usize::try_from(y).ok().filter(|y| *y < BOARD_SIZE)?;
    Some((x, y))
}
