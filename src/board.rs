//! Connect-K board: grid storage, gravity drops, and win/draw detection.
//!
//! The grid is stored row-major with row 0 at the top and row `n - 1` at the
//! bottom, so a dropped mark falls toward higher row indices. Blocked cells are
//! fixed at construction and act as occupied cells for gravity while never
//! matching either player.

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DIRECTIONS, GLYPH_BLOCKED, GLYPH_EMPTY, GLYPH_PLAYER1, GLYPH_PLAYER2, MAX_CELLS, MAX_K,
    MIN_COLS, MIN_K, MIN_ROWS,
};
use crate::eval;

/// State of a single grid cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    Empty,
    Player1,
    Player2,
    Blocked,
}

impl Cell {
    /// Numeric encoding used by transports: 0 empty, 1/2 players, -1 blocked.
    pub fn code(self) -> i8 {
        match self {
            Cell::Empty => 0,
            Cell::Player1 => 1,
            Cell::Player2 => 2,
            Cell::Blocked => -1,
        }
    }

    pub fn from_code(code: i8) -> Option<Cell> {
        match code {
            0 => Some(Cell::Empty),
            1 => Some(Cell::Player1),
            2 => Some(Cell::Player2),
            -1 => Some(Cell::Blocked),
            _ => None,
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Cell::Empty => GLYPH_EMPTY,
            Cell::Player1 => GLYPH_PLAYER1,
            Cell::Player2 => GLYPH_PLAYER2,
            Cell::Blocked => GLYPH_BLOCKED,
        }
    }

    pub fn from_glyph(ch: char) -> Option<Cell> {
        match ch {
            GLYPH_EMPTY => Some(Cell::Empty),
            GLYPH_PLAYER1 => Some(Cell::Player1),
            GLYPH_PLAYER2 => Some(Cell::Player2),
            GLYPH_BLOCKED => Some(Cell::Blocked),
            _ => None,
        }
    }
}

/// One of the two sides. Player 1 maximizes the score, player 2 minimizes it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn other(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// The mark this player leaves on the grid.
    pub fn cell(self) -> Cell {
        match self {
            Player::One => Cell::Player1,
            Player::Two => Cell::Player2,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Player> {
        match id {
            1 => Some(Player::One),
            2 => Some(Player::Two),
            _ => None,
        }
    }

    #[inline]
    pub fn is_maximizer(self) -> bool {
        self == Player::One
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Errors raised while building a board from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board must have at least one row")]
    NoRows,
    #[error("board must have at least one column")]
    NoCols,
    #[error("win length k must be at least 1")]
    ZeroK,
    #[error("a {rows}x{cols} board exceeds {max} cells", max = MAX_CELLS)]
    TooLarge { rows: usize, cols: usize },
    #[error("expected a {rows}x{cols} grid")]
    Shape { rows: usize, cols: usize },
    #[error("unknown cell glyph {0:?}")]
    UnknownGlyph(char),
}

/// Board dimensions and win length, fixed for the lifetime of a game.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameParams {
    /// Number of rows (n)
    pub rows: usize,
    /// Number of columns (m)
    pub cols: usize,
    /// Run length needed to win
    pub k: usize,
}

impl GameParams {
    /// Validate the structural constraints n >= 1, m >= 1, k >= 1 and
    /// n * m <= [`MAX_CELLS`].
    pub fn new(rows: usize, cols: usize, k: usize) -> Result<Self, BoardError> {
        if rows == 0 {
            return Err(BoardError::NoRows);
        }
        if cols == 0 {
            return Err(BoardError::NoCols);
        }
        if k == 0 {
            return Err(BoardError::ZeroK);
        }
        match rows.checked_mul(cols) {
            Some(cells) if cells <= MAX_CELLS => Ok(Self { rows, cols, k }),
            _ => Err(BoardError::TooLarge { rows, cols }),
        }
    }

    /// Whether these parameters satisfy the range policy for new sessions
    /// (n >= 5, m >= 6, 3 <= k <= 5).
    pub fn within_policy(&self) -> bool {
        self.rows >= MIN_ROWS && self.cols >= MIN_COLS && (MIN_K..=MAX_K).contains(&self.k)
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }
}

/// Serialized shape of a board: the parameters plus an n x m cell matrix.
#[derive(Serialize, Deserialize)]
struct BoardRepr {
    params: GameParams,
    cells: Vec<Vec<Cell>>,
}

/// A Connect-K grid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BoardRepr", into = "BoardRepr")]
pub struct Board {
    params: GameParams,
    cells: Vec<Cell>,
}

impl Board {
    /// Create an empty board with the given blocked cells.
    ///
    /// Coordinates outside the grid are skipped.
    pub fn new<I>(params: GameParams, blocked: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut board = Self {
            params,
            cells: vec![Cell::Empty; params.cell_count()],
        };
        for (row, col) in blocked {
            if row < params.rows && col < params.cols {
                let i = board.idx(row, col);
                board.cells[i] = Cell::Blocked;
            } else {
                warn!(
                    "ignoring blocked cell ({row}, {col}) outside {}x{} board",
                    params.rows, params.cols
                );
            }
        }
        board
    }

    /// Build a board from text rows using the glyphs `.`, `X`, `O`, `#`.
    /// Whitespace inside a row is ignored.
    pub fn from_rows(k: usize, rows: &[&str]) -> Result<Self, BoardError> {
        let grid = rows
            .iter()
            .map(|line| {
                line.chars()
                    .filter(|c| !c.is_whitespace())
                    .map(|c| Cell::from_glyph(c).ok_or(BoardError::UnknownGlyph(c)))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        let cols = grid.first().map_or(0, Vec::len);
        let params = GameParams::new(grid.len(), cols, k)?;
        Self::from_matrix(params, grid)
    }

    /// Build a board from an explicit cell matrix.
    pub fn from_matrix(params: GameParams, grid: Vec<Vec<Cell>>) -> Result<Self, BoardError> {
        let shape = BoardError::Shape {
            rows: params.rows,
            cols: params.cols,
        };
        if grid.len() != params.rows || grid.iter().any(|r| r.len() != params.cols) {
            return Err(shape);
        }
        Ok(Self {
            params,
            cells: grid.into_iter().flatten().collect(),
        })
    }

    #[inline]
    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.params.cols + col
    }

    pub fn params(&self) -> GameParams {
        self.params
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.params.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.params.cols
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.params.k
    }

    /// Cell at (row, col), or `None` when out of bounds.
    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        if row >= self.rows() || col >= self.cols() {
            return None;
        }
        Some(self.cells[self.idx(row, col)])
    }

    /// One row of the grid, or `None` when out of bounds.
    pub fn row(&self, row: usize) -> Option<&[Cell]> {
        if row >= self.rows() {
            return None;
        }
        let start = row * self.cols();
        Some(&self.cells[start..start + self.cols()])
    }

    /// The grid as an n x m matrix.
    pub fn to_matrix(&self) -> Vec<Vec<Cell>> {
        self.cells.chunks(self.cols()).map(<[Cell]>::to_vec).collect()
    }

    /// Cell reached from (row, col) after `steps` steps along (dr, dc).
    #[inline]
    pub(crate) fn offset(
        &self,
        row: usize,
        col: usize,
        (dr, dc): (isize, isize),
        steps: isize,
    ) -> Option<(usize, usize)> {
        let r = row.checked_add_signed(dr * steps)?;
        let c = col.checked_add_signed(dc * steps)?;
        (r < self.rows() && c < self.cols()).then_some((r, c))
    }

    /// A column accepts moves while its top cell is empty.
    #[inline]
    pub fn is_legal(&self, col: usize) -> bool {
        self.cell(0, col) == Some(Cell::Empty)
    }

    /// Columns whose top cell is empty, ascending.
    pub fn legal_moves(&self) -> Vec<usize> {
        (0..self.cols()).filter(|&c| self.is_legal(c)).collect()
    }

    /// Lowest empty row in `col`, scanning from the bottom up.
    pub fn drop_row(&self, col: usize) -> Option<usize> {
        if col >= self.cols() {
            return None;
        }
        (0..self.rows())
            .rev()
            .find(|&r| self.cells[self.idx(r, col)] == Cell::Empty)
    }

    /// Drop a mark for `player` into `col` and return the landing row.
    /// Leaves the board untouched when the column has no empty cell.
    pub fn place(&mut self, col: usize, player: Player) -> Option<usize> {
        let row = self.drop_row(col)?;
        let i = self.idx(row, col);
        self.cells[i] = player.cell();
        Some(row)
    }

    /// Take back a mark placed by [`Board::place`]. Blocked cells are never touched.
    pub(crate) fn undo(&mut self, row: usize, col: usize) {
        let i = self.idx(row, col);
        debug_assert!(matches!(self.cells[i], Cell::Player1 | Cell::Player2));
        if self.cells[i] != Cell::Blocked {
            self.cells[i] = Cell::Empty;
        }
    }

    /// Length of the run of `mark` through (row, col) along `dir`, counting
    /// (row, col) itself plus both senses of the direction.
    fn run_length(&self, row: usize, col: usize, dir: (isize, isize), mark: Cell) -> usize {
        let mut count = 1;
        for sense in [1, -1] {
            let mut steps = sense;
            while let Some((r, c)) = self.offset(row, col, dir, steps) {
                if self.cells[self.idx(r, c)] != mark {
                    break;
                }
                count += 1;
                steps += sense;
            }
        }
        count
    }

    /// Whether the mark just placed at (row, col) completes a run of k for `player`.
    pub fn check_win(&self, row: usize, col: usize, player: Player) -> bool {
        if row >= self.rows() || col >= self.cols() {
            return false;
        }
        let mark = player.cell();
        DIRECTIONS
            .iter()
            .any(|&dir| self.run_length(row, col, dir, mark) >= self.k())
    }

    /// No column accepts another move. Callers check for a win first.
    pub fn check_draw(&self) -> bool {
        self.legal_moves().is_empty()
    }

    /// Static positional score; positive favours player 1.
    pub fn evaluate(&self) -> i64 {
        eval::evaluate(self)
    }

    /// Every cell that is part of a complete run of k marks for `player`,
    /// in row-major order.
    pub fn winning_cells(&self, player: Player) -> Vec<(usize, usize)> {
        let mark = player.cell();
        let k = self.k() as isize;
        let mut hit = vec![false; self.cells.len()];
        for row in 0..self.rows() {
            for col in 0..self.cols() {
                for &dir in &DIRECTIONS {
                    let line: Option<Vec<(usize, usize)>> =
                        (0..k).map(|i| self.offset(row, col, dir, i)).collect();
                    let Some(line) = line else { continue };
                    if line.iter().all(|&(r, c)| self.cells[self.idx(r, c)] == mark) {
                        for (r, c) in line {
                            hit[self.idx(r, c)] = true;
                        }
                    }
                }
            }
        }
        hit.iter()
            .enumerate()
            .filter(|&(_, &h)| h)
            .map(|(i, _)| (i / self.cols(), i % self.cols()))
            .collect()
    }
}

impl TryFrom<BoardRepr> for Board {
    type Error = BoardError;

    fn try_from(repr: BoardRepr) -> Result<Self, Self::Error> {
        let params = GameParams::new(repr.params.rows, repr.params.cols, repr.params.k)?;
        Board::from_matrix(params, repr.cells)
    }
}

impl From<Board> for BoardRepr {
    fn from(board: Board) -> Self {
        BoardRepr {
            params: board.params,
            cells: board.to_matrix(),
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.cols()) {
            for cell in row {
                write!(f, "{} ", cell.glyph())?;
            }
            writeln!(f)?;
        }
        for col in 0..self.cols() {
            write!(f, "{} ", col % 10)?;
        }
        writeln!(f)
    }
}
