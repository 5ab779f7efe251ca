//! Constants for scoring, search defaults, and session parameter policy.
//!
//! Board dimensions are runtime values carried by
//! [`GameParams`](crate::board::GameParams); nothing here fixes the grid size.

// =============================================================================
// Line Geometry
// =============================================================================

/// The four line directions as (row delta, column delta).
/// Order: horizontal, vertical, diagonal down-right, diagonal down-left.
///
/// Only the positive sense of each axis is listed. Win detection walks both
/// senses itself; the evaluator relies on the single sense to avoid
/// generating each window twice.
pub const DIRECTIONS: [(isize, isize); 4] = [
    (0, 1),  // Horizontal
    (1, 0),  // Vertical
    (1, 1),  // Diagonal down-right
    (1, -1), // Diagonal down-left (up-right when read bottom to top)
];

// =============================================================================
// Search Parameters
// =============================================================================

/// Base value assigned to a move that wins on the spot.
/// The remaining depth is added on top so that quicker wins score higher.
pub const WIN_SCORE: i64 = 1_000_000;

/// Default search depth (plies) for engine moves.
pub const DEFAULT_DEPTH: u32 = 3;

/// Base of the per-window heuristic: a pure run of `p` marks scores `BASE^(p-1)`.
pub const WINDOW_BASE: i64 = 10;

// =============================================================================
// Session Parameter Policy
// =============================================================================

/// Smallest number of rows accepted for a new game.
pub const MIN_ROWS: usize = 5;

/// Smallest number of columns accepted for a new game.
pub const MIN_COLS: usize = 6;

/// Smallest win length accepted for a new game.
pub const MIN_K: usize = 3;

/// Largest win length accepted for a new game.
pub const MAX_K: usize = 5;

/// Largest grid (n * m) any board may have.
pub const MAX_CELLS: usize = 1 << 20;

// =============================================================================
// Cell Glyphs (text rendering)
// =============================================================================

/// Empty cell.
pub const GLYPH_EMPTY: char = '.';

/// Player 1 mark.
pub const GLYPH_PLAYER1: char = 'X';

/// Player 2 mark.
pub const GLYPH_PLAYER2: char = 'O';

/// Blocked cell.
pub const GLYPH_BLOCKED: char = '#';
