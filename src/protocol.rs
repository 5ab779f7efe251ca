//! Connect-K Text Protocol (CKTP).
//!
//! A line-oriented command protocol in the style of GTP: each request is an
//! optional numeric id followed by a command and its arguments; each reply is
//! `=[id] message` on success or `?[id] message` on failure, followed by a
//! blank line. Blank lines and lines starting with `#` are skipped.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`, `list_commands`
//! - `known_command <cmd>` - Check if a command is supported
//! - `quit` - Exit the command loop
//! - `new_game <n> <m> <k> [depth] [mode] [blocked]` - Start a game;
//!   `blocked` is a random cell count (`4`) or a list (`4:2,0:5`)
//! - `clear_game` - Drop the current game
//! - `play <col>` - Drop a mark for the side to move
//! - `genmove` - Let the engine choose and play a move
//! - `resign` - The side to move resigns
//! - `state` - JSON snapshot of the game
//! - `showboard` - Text rendering of the board
//! - `legal_moves` - Columns that accept a move
//! - `evaluate` - Static evaluation of the board
//! - `analyze` - Search result for the side to move, without playing
//! - `depth <d>` - Set the search depth
//! - `winning_cells` - Cells of the winning run once the game is won
//!
//! ## Example
//!
//! ```ignore
//! use connect_k::protocol::ProtocolEngine;
//! let mut engine = ProtocolEngine::new();
//! engine.run(std::io::stdin().lock(), std::io::stdout())?;
//! ```

use std::io::{BufRead, Write};

use anyhow::{Context, Result, anyhow, bail};
use log::{debug, warn};

use crate::constants::DEFAULT_DEPTH;
use crate::game::{BlockedCells, GameConfig, GameSession, Mode};

/// The list of known protocol commands.
const KNOWN_COMMANDS: &[&str] = &[
    "analyze",
    "clear_game",
    "depth",
    "evaluate",
    "genmove",
    "known_command",
    "legal_moves",
    "list_commands",
    "name",
    "new_game",
    "play",
    "protocol_version",
    "quit",
    "resign",
    "showboard",
    "state",
    "version",
    "winning_cells",
];

/// Protocol engine state.
pub struct ProtocolEngine {
    /// Game in play, if any
    session: Option<GameSession>,
    /// Depth used for games started without an explicit depth
    default_depth: u32,
    /// Seed for random blocked cells
    seed: Option<u64>,
}

impl Default for ProtocolEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolEngine {
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_DEPTH, None)
    }

    /// Create an engine with a default search depth and an optional seed.
    pub fn with_settings(default_depth: u32, seed: Option<u64>) -> Self {
        Self {
            session: None,
            default_depth,
            seed,
        }
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        for line in input.lines() {
            let line = line.context("failed to read command")?;

            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);

            let parts: Vec<&str> = command_line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }

            let command = parts[0].to_lowercase();
            let args = &parts[1..];
            debug!("command {command} {args:?}");

            let (success, message) = self.execute(&command, args);
            if !success {
                warn!("{command} failed: {message}");
            }

            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            writeln!(output, "{prefix}{id_str} {message}\n").context("failed to write response")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    /// Execute a command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match self.dispatch(command, args) {
            Ok(message) => (true, message),
            Err(e) => (false, format!("{e:#}")),
        }
    }

    fn dispatch(&mut self, command: &str, args: &[&str]) -> Result<String> {
        match command {
            "name" => Ok(env!("CARGO_PKG_NAME").to_string()),

            "version" => Ok(env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => Ok("1".to_string()),

            "list_commands" => Ok(KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let cmd = args.first().ok_or_else(|| anyhow!("missing argument"))?;
                let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                Ok(known.to_string())
            }

            "quit" => Ok(String::new()),

            "new_game" => {
                let config = self.parse_new_game(args)?;
                self.session = Some(GameSession::new(&config)?);
                Ok(String::new())
            }

            "clear_game" => {
                self.session = None;
                Ok(String::new())
            }

            "play" => {
                let col = parse_arg::<usize>(args, 0, "column")?;
                let outcome = self.active_mut()?.play(col)?;
                Ok(format!("{} {}", outcome.row, outcome.status))
            }

            "genmove" => {
                let outcome = self.active_mut()?.ai_move()?;
                Ok(format!("{} {} {}", outcome.column, outcome.row, outcome.status))
            }

            "resign" => {
                let winner = self.active_mut()?.resign()?;
                Ok(format!("won {winner}"))
            }

            "state" => {
                let snapshot = self.active()?.snapshot();
                Ok(serde_json::to_string(&snapshot)?)
            }

            "showboard" => Ok(format!("\n{}", self.active()?.board())),

            "legal_moves" => Ok(join(self.active()?.board().legal_moves())),

            "evaluate" => Ok(self.active()?.board().evaluate().to_string()),

            "analyze" => {
                let result = self.active()?.analyze();
                let best = result.best_move.map_or("none".to_string(), |c| c.to_string());
                Ok(format!("{best} {}", result.value))
            }

            "depth" => {
                let depth = parse_arg::<u32>(args, 0, "depth")?;
                match self.session.as_mut() {
                    Some(session) => session.set_depth(depth)?,
                    None if depth == 0 => bail!("search depth must be at least 1"),
                    None => {}
                }
                self.default_depth = depth;
                Ok(String::new())
            }

            "winning_cells" => {
                let cells = self.active()?.winning_cells();
                Ok(cells
                    .iter()
                    .map(|(r, c)| format!("{r}:{c}"))
                    .collect::<Vec<_>>()
                    .join(" "))
            }

            _ => bail!("unknown command: {command}"),
        }
    }

    fn active(&self) -> Result<&GameSession> {
        self.session.as_ref().ok_or_else(|| anyhow!("no active game"))
    }

    fn active_mut(&mut self) -> Result<&mut GameSession> {
        self.session.as_mut().ok_or_else(|| anyhow!("no active game"))
    }

    fn parse_new_game(&self, args: &[&str]) -> Result<GameConfig> {
        if args.len() < 3 {
            bail!("usage: new_game <n> <m> <k> [depth] [mode] [blocked]");
        }
        let depth = match args.get(3) {
            Some(_) => parse_arg::<u32>(args, 3, "depth")?,
            None => self.default_depth,
        };
        let mode = match args.get(4) {
            Some(s) => s.parse::<Mode>()?,
            None => Mode::HumanAi,
        };
        let blocked = match args.get(5) {
            Some(s) => parse_blocked(s)?,
            None => BlockedCells::None,
        };
        Ok(GameConfig {
            rows: parse_arg(args, 0, "n")?,
            cols: parse_arg(args, 1, "m")?,
            k: parse_arg(args, 2, "k")?,
            depth,
            mode,
            blocked,
            seed: self.seed,
        })
    }
}

fn parse_arg<T: std::str::FromStr>(args: &[&str], index: usize, name: &str) -> Result<T> {
    let raw = args.get(index).ok_or_else(|| anyhow!("missing argument: {name}"))?;
    raw.parse::<T>().map_err(|_| anyhow!("invalid {name}: {raw}"))
}

/// Parse either a random blocked-cell count (`4`) or a list (`4:2,0:5`).
pub fn parse_blocked(s: &str) -> Result<BlockedCells> {
    if let Ok(count) = s.parse::<usize>() {
        return Ok(BlockedCells::Random(count));
    }
    let cells = s
        .split(',')
        .filter(|p| !p.is_empty())
        .map(parse_cell)
        .collect::<Result<Vec<_>>>()?;
    Ok(BlockedCells::List(cells))
}

/// Parse a `row:col` coordinate.
pub fn parse_cell(s: &str) -> Result<(usize, usize)> {
    let (r, c) = s
        .split_once(':')
        .ok_or_else(|| anyhow!("invalid cell {s:?}, expected row:col"))?;
    let row: usize = r.trim().parse().with_context(|| format!("invalid row in {s:?}"))?;
    let col: usize = c.trim().parse().with_context(|| format!("invalid column in {s:?}"))?;
    Ok((row, col))
}

fn join(cols: Vec<usize>) -> String {
    cols.iter().map(usize::to_string).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_with_id() {
        let (id, cmd) = ProtocolEngine::parse_id("123 name");
        assert_eq!(id, Some(123));
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_parse_id_without_id() {
        let (id, cmd) = ProtocolEngine::parse_id("name");
        assert_eq!(id, None);
        assert_eq!(cmd, "name");
    }

    #[test]
    fn test_name_command() {
        let mut engine = ProtocolEngine::new();
        let (success, response) = engine.execute("name", &[]);
        assert!(success);
        assert_eq!(response, "connect-k");
    }

    #[test]
    fn test_known_command() {
        let mut engine = ProtocolEngine::new();

        let (success, response) = engine.execute("known_command", &["genmove"]);
        assert!(success);
        assert_eq!(response, "true");

        let (success, response) = engine.execute("known_command", &["boardsize"]);
        assert!(success);
        assert_eq!(response, "false");
    }

    #[test]
    fn test_requires_active_game() {
        let mut engine = ProtocolEngine::new();
        let (success, response) = engine.execute("play", &["0"]);
        assert!(!success);
        assert_eq!(response, "no active game");
    }

    #[test]
    fn test_new_game_validation() {
        let mut engine = ProtocolEngine::new();
        let (success, response) = engine.execute("new_game", &["4", "7", "4"]);
        assert!(!success);
        assert!(response.starts_with("parameters out of range"));

        let (success, _) = engine.execute("new_game", &["6", "7"]);
        assert!(!success);

        let (success, _) = engine.execute("new_game", &["6", "7", "4", "2", "bogus"]);
        assert!(!success);
        assert!(engine.session().is_none());
    }

    #[test]
    fn test_new_game_rejects_oversized_board() {
        let mut engine = ProtocolEngine::new();
        let (success, response) = engine.execute("new_game", &["9223372036854775807", "6", "3"]);
        assert!(!success);
        assert!(response.contains("exceeds"));

        let (success, _) = engine.execute("new_game", &["100000", "100000", "4"]);
        assert!(!success);
        assert!(engine.session().is_none());
    }

    #[test]
    fn test_play_and_clear() {
        let mut engine = ProtocolEngine::new();
        let (success, _) = engine.execute("new_game", &["5", "6", "3", "2", "human-human", "4:2"]);
        assert!(success);

        let (success, response) = engine.execute("play", &["2"]);
        assert!(success);
        assert_eq!(response, "3 in_progress");

        let (success, response) = engine.execute("legal_moves", &[]);
        assert!(success);
        assert_eq!(response, "0 1 2 3 4 5");

        let (success, _) = engine.execute("play", &["x"]);
        assert!(!success);

        let (success, _) = engine.execute("clear_game", &[]);
        assert!(success);
        assert!(engine.session().is_none());
    }

    #[test]
    fn test_depth_command() {
        let mut engine = ProtocolEngine::new();
        let (success, _) = engine.execute("depth", &["0"]);
        assert!(!success);
        let (success, _) = engine.execute("depth", &["5"]);
        assert!(success);
        engine.execute("new_game", &["6", "7", "4"]);
        assert_eq!(engine.session().unwrap().depth(), 5);
    }

    #[test]
    fn test_parse_blocked() {
        assert_eq!(parse_blocked("3").unwrap(), BlockedCells::Random(3));
        assert_eq!(
            parse_blocked("4:2,0:5").unwrap(),
            BlockedCells::List(vec![(4, 2), (0, 5)])
        );
        assert!(parse_blocked("4-2").is_err());
        assert!(parse_blocked("a:1").is_err());
    }

    #[test]
    fn test_run_loop() {
        let input = "# comment\n1 new_game 5 6 3 3 human-human\n\nplay 1\n2 play 1\n\
                     play 2\nplay 2\ngenmove\nwinning_cells\nquit\nname\n";
        let mut out = Vec::new();
        let mut engine = ProtocolEngine::new();
        engine.run(input.as_bytes(), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let replies: Vec<&str> = out.split("\n\n").filter(|s| !s.is_empty()).collect();
        assert_eq!(
            replies,
            vec![
                "=1 ",
                "= 4 in_progress",
                "=2 3 in_progress",
                "= 4 in_progress",
                "= 3 in_progress",
                "= 0 4 won 1",
                "= 4:0 4:1 4:2",
                "= ",
            ]
        );
    }
}
