//! Game sessions: turn order, game status, and engine moves for one game.
//!
//! A [`GameSession`] is an owned value; front ends keep as many as they need
//! and pass the one in play to each call.

use std::fmt;
use std::str::FromStr;

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Board, BoardError, GameParams, Player};
use crate::constants::DEFAULT_DEPTH;
use crate::search::{SearchResult, search};

/// Who drives each side.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    HumanHuman,
    /// The engine plays player 2
    HumanAi,
    AiAi,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::HumanHuman => "human-human",
            Mode::HumanAi => "human-ai",
            Mode::AiAi => "ai-ai",
        };
        f.write_str(name)
    }
}

impl FromStr for Mode {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "human-human" => Ok(Mode::HumanHuman),
            "human-ai" => Ok(Mode::HumanAi),
            "ai-ai" => Ok(Mode::AiAi),
            _ => Err(GameError::UnknownMode(s.to_string())),
        }
    }
}

/// How blocked cells are chosen for a new game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlockedCells {
    None,
    /// This many distinct cells drawn at random
    Random(usize),
    /// Explicit (row, col) coordinates
    List(Vec<(usize, usize)>),
}

/// Settings for a new game.
#[derive(Clone, Debug)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub k: usize,
    pub depth: u32,
    pub mode: Mode,
    pub blocked: BlockedCells,
    /// Seed for random blocked cells (random if unset)
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: 6,
            cols: 7,
            k: 4,
            depth: DEFAULT_DEPTH,
            mode: Mode::HumanAi,
            blocked: BlockedCells::None,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("parameters out of range: n>=5, m>=6, k in [3,5] (got n={rows}, m={cols}, k={k})")]
    ParamsOutOfRange { rows: usize, cols: usize, k: usize },
    #[error("search depth must be at least 1")]
    ZeroDepth,
    #[error("unknown mode {0:?} (expected human-human, human-ai or ai-ai)")]
    UnknownMode(String),
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error("game already over")]
    GameOver,
    #[error("illegal move: column {0}")]
    IllegalMove(usize),
    #[error("no legal moves")]
    NoLegalMoves,
}

/// Where the game stands.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    InProgress,
    Won(Player),
    Draw,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        self != GameStatus::InProgress
    }

    pub fn winner(self) -> Option<Player> {
        match self {
            GameStatus::Won(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::InProgress => f.write_str("in_progress"),
            GameStatus::Won(p) => write!(f, "won {p}"),
            GameStatus::Draw => f.write_str("draw"),
        }
    }
}

/// Result of a move applied to a session.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    pub column: usize,
    pub row: usize,
    pub player: Player,
    pub status: GameStatus,
}

/// Transport view of a session: cell codes (0, 1, 2, -1), side to move,
/// and the winner (0 when none).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub board: Vec<Vec<i8>>,
    pub player: u8,
    pub game_over: bool,
    pub winner: u8,
}

/// One game in progress or finished.
#[derive(Clone, Debug)]
pub struct GameSession {
    board: Board,
    to_move: Player,
    status: GameStatus,
    mode: Mode,
    depth: u32,
}

impl GameSession {
    /// Start a game. Enforces n >= 5, m >= 6, 3 <= k <= 5 and depth >= 1.
    pub fn new(config: &GameConfig) -> Result<Self, GameError> {
        let params = GameParams::new(config.rows, config.cols, config.k)?;
        if !params.within_policy() {
            return Err(GameError::ParamsOutOfRange {
                rows: config.rows,
                cols: config.cols,
                k: config.k,
            });
        }
        if config.depth == 0 {
            return Err(GameError::ZeroDepth);
        }

        let blocked = match &config.blocked {
            BlockedCells::None => Vec::new(),
            BlockedCells::Random(count) => {
                let mut rng = match config.seed {
                    Some(seed) => fastrand::Rng::with_seed(seed),
                    None => fastrand::Rng::new(),
                };
                random_blocked(params, *count, &mut rng)
            }
            BlockedCells::List(cells) => cells.clone(),
        };

        let board = Board::new(params, blocked);
        info!(
            "new game {}x{} k={} depth={} mode={}",
            params.rows, params.cols, params.k, config.depth, config.mode
        );
        Ok(Self {
            board,
            to_move: Player::One,
            status: GameStatus::InProgress,
            mode: config.mode,
            depth: config.depth,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn to_move(&self) -> Player {
        self.to_move
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn set_depth(&mut self, depth: u32) -> Result<(), GameError> {
        if depth == 0 {
            return Err(GameError::ZeroDepth);
        }
        self.depth = depth;
        Ok(())
    }

    /// Whether the engine is expected to make the next move.
    pub fn ai_to_move(&self) -> bool {
        if self.status.is_over() {
            return false;
        }
        match self.mode {
            Mode::HumanHuman => false,
            Mode::HumanAi => self.to_move == Player::Two,
            Mode::AiAi => true,
        }
    }

    /// Drop a mark for the side to move. A win is checked before a draw; on
    /// either the game ends and the mover stays recorded as `to_move`.
    pub fn play(&mut self, col: usize) -> Result<MoveOutcome, GameError> {
        if self.status.is_over() {
            return Err(GameError::GameOver);
        }
        if !self.board.is_legal(col) {
            return Err(GameError::IllegalMove(col));
        }
        let player = self.to_move;
        let row = self.board.place(col, player).ok_or(GameError::IllegalMove(col))?;

        if self.board.check_win(row, col, player) {
            self.status = GameStatus::Won(player);
            info!("player {player} wins at ({row}, {col})");
        } else if self.board.check_draw() {
            self.status = GameStatus::Draw;
            info!("game drawn");
        } else {
            self.to_move = player.other();
        }

        Ok(MoveOutcome {
            column: col,
            row,
            player,
            status: self.status,
        })
    }

    /// Search for the side to move at the session depth, without playing.
    pub fn analyze(&self) -> SearchResult {
        search(&self.board, self.depth, self.to_move)
    }

    /// Let the engine choose and play a move for the side to move.
    pub fn ai_move(&mut self) -> Result<MoveOutcome, GameError> {
        if self.status.is_over() {
            return Err(GameError::GameOver);
        }
        let result = self.analyze();
        let col = result.best_move.ok_or(GameError::NoLegalMoves)?;
        info!(
            "engine plays column {col} for player {} (value {}, {} nodes)",
            self.to_move, result.value, result.nodes
        );
        self.play(col)
    }

    /// The side to move gives up; the opponent wins.
    pub fn resign(&mut self) -> Result<Player, GameError> {
        if self.status.is_over() {
            return Err(GameError::GameOver);
        }
        let winner = self.to_move.other();
        self.status = GameStatus::Won(winner);
        info!("player {} resigns", self.to_move);
        Ok(winner)
    }

    /// Cells of the winning run(s), empty unless the game was won on the board.
    pub fn winning_cells(&self) -> Vec<(usize, usize)> {
        self.status
            .winner()
            .map(|p| self.board.winning_cells(p))
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self
                .board
                .to_matrix()
                .iter()
                .map(|row| row.iter().map(|c| c.code()).collect())
                .collect(),
            player: self.to_move.id(),
            game_over: self.status.is_over(),
            winner: self.status.winner().map_or(0, Player::id),
        }
    }
}

/// Pick `count` distinct cells uniformly at random (clamped to the grid size).
pub fn random_blocked(
    params: GameParams,
    count: usize,
    rng: &mut fastrand::Rng,
) -> Vec<(usize, usize)> {
    let mut cells: Vec<usize> = (0..params.cell_count()).collect();
    rng.shuffle(&mut cells);
    cells.truncate(count);
    cells.sort_unstable();
    cells
        .into_iter()
        .map(|i| (i / params.cols, i % params.cols))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;

    fn config(rows: usize, cols: usize, k: usize) -> GameConfig {
        GameConfig {
            rows,
            cols,
            k,
            mode: Mode::HumanHuman,
            ..GameConfig::default()
        }
    }

    fn count_blocked(session: &GameSession) -> usize {
        session
            .board()
            .to_matrix()
            .iter()
            .flatten()
            .filter(|&&c| c == Cell::Blocked)
            .count()
    }

    #[test]
    fn test_rejects_params_out_of_range() {
        for (n, m, k) in [(4, 7, 4), (6, 5, 4), (6, 7, 2), (6, 7, 6)] {
            let err = GameSession::new(&config(n, m, k)).unwrap_err();
            assert!(matches!(err, GameError::ParamsOutOfRange { .. }));
        }
        let err = GameSession::new(&config(0, 7, 4)).unwrap_err();
        assert_eq!(err, GameError::Board(BoardError::NoRows));
    }

    #[test]
    fn test_rejects_zero_depth() {
        let cfg = GameConfig { depth: 0, ..config(6, 7, 4) };
        assert_eq!(GameSession::new(&cfg).unwrap_err(), GameError::ZeroDepth);
    }

    #[test]
    fn test_random_blocked_count_and_seed() {
        let cfg = GameConfig {
            blocked: BlockedCells::Random(5),
            seed: Some(42),
            ..config(6, 7, 4)
        };
        let a = GameSession::new(&cfg).unwrap();
        let b = GameSession::new(&cfg).unwrap();
        assert_eq!(count_blocked(&a), 5);
        assert_eq!(a.board(), b.board());
    }

    #[test]
    fn test_random_blocked_clamped() {
        let params = GameParams::new(2, 2, 2).unwrap();
        let mut rng = fastrand::Rng::with_seed(7);
        let cells = random_blocked(params, 10, &mut rng);
        assert_eq!(cells, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_explicit_blocked_list() {
        let cfg = GameConfig {
            blocked: BlockedCells::List(vec![(4, 2), (0, 5), (40, 40)]),
            ..config(5, 6, 3)
        };
        let session = GameSession::new(&cfg).unwrap();
        assert_eq!(count_blocked(&session), 2);
        assert_eq!(session.board().legal_moves(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_turns_alternate_and_win_ends_game() {
        let mut session = GameSession::new(&config(5, 6, 3)).unwrap();
        for col in [0, 0, 1, 1] {
            let outcome = session.play(col).unwrap();
            assert_eq!(outcome.status, GameStatus::InProgress);
        }
        assert_eq!(session.to_move(), Player::One);
        let outcome = session.play(2).unwrap();
        assert_eq!(outcome.status, GameStatus::Won(Player::One));
        assert_eq!(session.to_move(), Player::One);
        assert_eq!(session.winning_cells(), vec![(4, 0), (4, 1), (4, 2)]);
        assert_eq!(session.play(3).unwrap_err(), GameError::GameOver);
        assert_eq!(session.ai_move().unwrap_err(), GameError::GameOver);
        assert_eq!(session.resign().unwrap_err(), GameError::GameOver);
    }

    #[test]
    fn test_draw_when_columns_capped() {
        let cfg = GameConfig {
            blocked: BlockedCells::List((1..6).map(|c| (0, c)).collect()),
            ..config(5, 6, 3)
        };
        let mut session = GameSession::new(&cfg).unwrap();
        for _ in 0..4 {
            assert_eq!(session.play(0).unwrap().status, GameStatus::InProgress);
        }
        let outcome = session.play(0).unwrap();
        assert_eq!(outcome.row, 0);
        assert_eq!(outcome.status, GameStatus::Draw);
        assert!(session.winning_cells().is_empty());
    }

    #[test]
    fn test_illegal_move_leaves_turn() {
        let cfg = GameConfig {
            blocked: BlockedCells::List(vec![(0, 2)]),
            ..config(5, 6, 3)
        };
        let mut session = GameSession::new(&cfg).unwrap();
        assert_eq!(session.play(2).unwrap_err(), GameError::IllegalMove(2));
        assert_eq!(session.play(6).unwrap_err(), GameError::IllegalMove(6));
        assert_eq!(session.to_move(), Player::One);
    }

    #[test]
    fn test_ai_move_completes_line() {
        let mut session = GameSession::new(&config(5, 6, 3)).unwrap();
        session.play(1).unwrap();
        session.play(5).unwrap();
        session.play(2).unwrap();
        session.play(5).unwrap();
        let outcome = session.ai_move().unwrap();
        assert_eq!(outcome.column, 0);
        assert_eq!(outcome.status, GameStatus::Won(Player::One));
    }

    #[test]
    fn test_resign() {
        let mut session = GameSession::new(&config(5, 6, 3)).unwrap();
        session.play(0).unwrap();
        assert_eq!(session.resign().unwrap(), Player::One);
        assert_eq!(session.status(), GameStatus::Won(Player::One));
        assert!(session.winning_cells().is_empty());
    }

    #[test]
    fn test_ai_to_move_by_mode() {
        let mut human_ai = GameSession::new(&GameConfig {
            mode: Mode::HumanAi,
            ..config(5, 6, 3)
        })
        .unwrap();
        assert!(!human_ai.ai_to_move());
        human_ai.play(0).unwrap();
        assert!(human_ai.ai_to_move());

        let ai_ai = GameSession::new(&GameConfig { mode: Mode::AiAi, ..config(5, 6, 3) }).unwrap();
        assert!(ai_ai.ai_to_move());

        let hh = GameSession::new(&config(5, 6, 3)).unwrap();
        assert!(!hh.ai_to_move());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("human-ai".parse::<Mode>().unwrap(), Mode::HumanAi);
        assert_eq!("AI-AI".parse::<Mode>().unwrap(), Mode::AiAi);
        assert!("robot".parse::<Mode>().is_err());
        assert_eq!(Mode::HumanHuman.to_string(), "human-human");
    }

    #[test]
    fn test_snapshot_json() {
        let cfg = GameConfig {
            blocked: BlockedCells::List(vec![(4, 5)]),
            ..config(5, 6, 3)
        };
        let mut session = GameSession::new(&cfg).unwrap();
        session.play(0).unwrap();
        let snap = session.snapshot();
        assert_eq!(snap.board[4], vec![1, 0, 0, 0, 0, -1]);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["player"], 2);
        assert_eq!(json["gameOver"], false);
        assert_eq!(json["winner"], 0);
    }
}
