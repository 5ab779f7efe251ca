//! Static evaluation by length-k window scanning.
//!
//! Every cell is the origin of up to four windows, one per direction in
//! [`DIRECTIONS`]. A window that would leave the grid is dropped. Windows
//! overlap freely, so a cell contributes once for every window covering it.
//!
//! A window holding marks of only one player scores `10^(p - 1)` for `p`
//! marks, positive for player 1 and negative for player 2. Mixed windows and
//! windows with no marks score zero. Blocked cells count for neither side.

use crate::board::{Board, Cell};
use crate::constants::{DIRECTIONS, WINDOW_BASE};

/// Sum of [`window_score`] over every complete window on the board.
pub fn evaluate(board: &Board) -> i64 {
    let mut score: i64 = 0;
    for row in 0..board.rows() {
        for col in 0..board.cols() {
            for &dir in &DIRECTIONS {
                if let Some((p1, p2)) = window_counts(board, row, col, dir) {
                    score = score.saturating_add(window_score(p1, p2));
                }
            }
        }
    }
    score
}

/// Count player marks in the k-cell window starting at (row, col) along `dir`.
/// Returns `None` if the window does not fit on the board.
pub fn window_counts(
    board: &Board,
    row: usize,
    col: usize,
    dir: (isize, isize),
) -> Option<(u32, u32)> {
    let (mut p1, mut p2) = (0, 0);
    for i in 0..board.k() as isize {
        let (r, c) = board.offset(row, col, dir, i)?;
        match board.cell(r, c)? {
            Cell::Player1 => p1 += 1,
            Cell::Player2 => p2 += 1,
            Cell::Empty | Cell::Blocked => {}
        }
    }
    Some((p1, p2))
}

/// Score of one window given the mark counts of each player.
#[inline]
pub fn window_score(p1: u32, p2: u32) -> i64 {
    match (p1, p2) {
        (0, 0) => 0,
        (p, 0) => WINDOW_BASE.saturating_pow(p - 1),
        (0, p) => -WINDOW_BASE.saturating_pow(p - 1),
        _ => 0,
    }
}
