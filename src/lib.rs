//! Connect-K: a generalized Connect Four engine.
//!
//! Games are played on an n x m grid with gravity drops, a configurable win
//! length k, and permanently blocked cells. The engine picks moves with a
//! depth-limited alpha-beta search over a window-counting heuristic.
//!
//! ## Modules
//!
//! - [`constants`] - Scoring, search defaults, and parameter policy
//! - [`board`] - Grid, gravity drops, win and draw detection
//! - [`eval`] - Heuristic evaluation over length-k windows
//! - [`search`] - Alpha-beta minimax
//! - [`game`] - Owned game sessions (turns, status, engine moves)
//! - [`protocol`] - Line-oriented text protocol front end
//!
//! ## Example
//!
//! ```
//! use connect_k::board::{Board, GameParams, Player};
//! use connect_k::search::search;
//!
//! let params = GameParams::new(6, 7, 4).unwrap();
//! let mut board = Board::new(params, [(5, 3)]);
//!
//! // The blocked cell holds up the mark
//! assert_eq!(board.place(3, Player::One), Some(4));
//!
//! let result = search(&board, 3, Player::Two);
//! println!("Best reply: {:?} ({})", result.best_move, result.value);
//! ```

pub mod board;
pub mod constants;
pub mod eval;
pub mod game;
pub mod protocol;
pub mod search;
