//! Depth-limited alpha-beta minimax.
//!
//! Player 1 maximizes and player 2 minimizes the score from
//! [`Board::evaluate`]. Moves are tried in ascending column order with no
//! further ordering and no transposition table.
//!
//! A move that wins on the spot is scored `±(WIN_SCORE + depth)` using the
//! depth remaining at the node where it is played, so faster wins outrank
//! slower ones and forced losses are pushed as far back as possible.
//!
//! The search clones the caller's board once and then explores branches by
//! placing and taking back marks on that copy; the caller's board is never
//! modified.

use log::debug;

use crate::board::{Board, Player};
use crate::constants::WIN_SCORE;

/// Outcome of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    /// Minimax value from player 1's point of view
    pub value: i64,
    /// Chosen column, or `None` at a terminal node
    pub best_move: Option<usize>,
    /// Number of nodes visited
    pub nodes: u64,
}

/// Search `depth` plies for `player` with full-width bounds.
pub fn search(board: &Board, depth: u32, player: Player) -> SearchResult {
    alpha_beta(board, depth, i64::MIN, i64::MAX, player)
}

/// Search `depth` plies for `player` inside the window (`alpha`, `beta`).
pub fn alpha_beta(
    board: &Board,
    depth: u32,
    alpha: i64,
    beta: i64,
    player: Player,
) -> SearchResult {
    let mut work = board.clone();
    let mut nodes = 0;
    let (value, best_move) = search_node(&mut work, depth, alpha, beta, player, &mut nodes);
    debug!(
        "search depth={depth} player={player} value={value} move={best_move:?} nodes={nodes}"
    );
    SearchResult {
        value,
        best_move,
        nodes,
    }
}

/// Score for `player` completing a line with `depth` plies left.
#[inline]
pub fn win_value(player: Player, depth: u32) -> i64 {
    let value = WIN_SCORE + i64::from(depth);
    if player.is_maximizer() { value } else { -value }
}

fn search_node(
    board: &mut Board,
    depth: u32,
    mut alpha: i64,
    mut beta: i64,
    player: Player,
    nodes: &mut u64,
) -> (i64, Option<usize>) {
    *nodes += 1;

    let moves = board.legal_moves();
    if depth == 0 || moves.is_empty() {
        return (board.evaluate(), None);
    }

    let maximizing = player.is_maximizer();
    let mut best_value = if maximizing { i64::MIN } else { i64::MAX };
    let mut best_move = moves[0];

    for col in moves {
        let Some(row) = board.place(col, player) else {
            continue;
        };
        let value = if board.check_win(row, col, player) {
            win_value(player, depth)
        } else {
            search_node(board, depth - 1, alpha, beta, player.other(), nodes).0
        };
        board.undo(row, col);

        if maximizing {
            if value > best_value {
                best_value = value;
                best_move = col;
            }
            alpha = alpha.max(value);
        } else {
            if value < best_value {
                best_value = value;
                best_move = col;
            }
            beta = beta.min(value);
        }
        if beta <= alpha {
            break;
        }
    }

    (best_value, Some(best_move))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::GameParams;

    fn empty(rows: usize, cols: usize, k: usize) -> Board {
        Board::new(GameParams::new(rows, cols, k).unwrap(), [])
    }

    #[test]
    fn test_depth_zero_returns_evaluation() {
        let board =
            Board::from_rows(3, &["......", "......", "......", "......", ".XX..."]).unwrap();
        let result = search(&board, 0, Player::One);
        assert_eq!(result.value, board.evaluate());
        assert_eq!(result.best_move, None);
        assert_eq!(result.nodes, 1);
    }

    #[test]
    fn test_no_legal_moves_returns_evaluation() {
        let board = Board::from_rows(3, &["XO#", "OXO"]).unwrap();
        let result = search(&board, 4, Player::Two);
        assert_eq!(result.best_move, None);
        assert_eq!(result.value, board.evaluate());
    }

    #[test]
    fn test_completes_three_in_a_row() {
        let mut board = empty(5, 6, 3);
        board.place(1, Player::One);
        board.place(2, Player::One);
        let result = search(&board, 3, Player::One);
        assert!(matches!(result.best_move, Some(0) | Some(3)));
        assert!(result.value >= WIN_SCORE);
        // Column 0 is tried first and column 3 only ties it
        assert_eq!(result.best_move, Some(0));
        assert_eq!(result.value, WIN_SCORE + 3);
    }

    #[test]
    fn test_minimizer_blocks_immediate_threat() {
        let board = Board::from_rows(
            4,
            &[".......", ".......", ".......", ".......", ".......", "XXX...."],
        )
        .unwrap();
        let result = search(&board, 2, Player::Two);
        assert_eq!(result.best_move, Some(3));
        assert!(result.value < WIN_SCORE);
    }

    #[test]
    fn test_minimizer_takes_own_win() {
        let board =
            Board::from_rows(3, &["......", "......", "......", "X.....", "XOO..."]).unwrap();
        let result = search(&board, 3, Player::Two);
        assert_eq!(result.best_move, Some(3));
        assert_eq!(result.value, -(WIN_SCORE + 3));
    }

    #[test]
    fn test_ties_resolve_to_lowest_column() {
        // Every column fills the same single window
        let board = empty(1, 3, 3);
        let max = search(&board, 1, Player::One);
        assert_eq!((max.value, max.best_move), (1, Some(0)));
        let min = search(&board, 1, Player::Two);
        assert_eq!((min.value, min.best_move), (-1, Some(0)));
    }

    #[test]
    fn test_capped_columns_skipped() {
        let board = Board::new(GameParams::new(1, 4, 2).unwrap(), [(0, 0), (0, 1)]);
        let result = search(&board, 1, Player::One);
        assert_eq!(result.best_move, Some(2));
    }

    #[test]
    fn test_caller_board_untouched() {
        let mut board = empty(5, 6, 3);
        board.place(2, Player::One);
        board.place(3, Player::Two);
        let before = board.clone();
        search(&board, 4, Player::One);
        assert_eq!(board, before);
    }

    #[test]
    fn test_prefers_quicker_win() {
        assert!(win_value(Player::One, 3) > win_value(Player::One, 1));
        assert!(win_value(Player::Two, 3) < win_value(Player::Two, 1));
    }
}
