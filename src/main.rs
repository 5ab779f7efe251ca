//! Connect-K: gravity-drop k-in-a-row with blocked cells and an alpha-beta engine.
//!
//! ## Usage
//!
//! - `connect-k` - Show a demo
//! - `connect-k protocol` - Serve the text protocol on stdin/stdout
//! - `connect-k analyze --rows 6 --cols 7 -k 4 --moves 3,3,4` - Search a position
//! - `connect-k selfplay` - Engine vs engine game

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::LevelFilter;

use connect_k::board::{Board, GameParams, Player};
use connect_k::constants::DEFAULT_DEPTH;
use connect_k::game::{BlockedCells, GameConfig, GameSession, Mode};
use connect_k::protocol::{ProtocolEngine, parse_cell};
use connect_k::search::search;

/// Connect-K: gravity-drop k-in-a-row engine
#[derive(Parser)]
#[command(name = "connect-k")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Search depth in plies
    #[arg(short, long, global = true, default_value_t = DEFAULT_DEPTH)]
    depth: u32,

    /// Seed for random blocked cells
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the Connect-K text protocol on stdin/stdout
    Protocol,
    /// Replay moves on a board and search the resulting position
    Analyze {
        #[arg(long, default_value_t = 6)]
        rows: usize,
        #[arg(long, default_value_t = 7)]
        cols: usize,
        #[arg(short, default_value_t = 4)]
        k: usize,
        /// Blocked cells as row:col
        #[arg(long, value_delimiter = ',')]
        blocked: Vec<String>,
        /// Columns played alternately, player 1 first
        #[arg(long, value_delimiter = ',')]
        moves: Vec<usize>,
    },
    /// Let the engine play both sides
    Selfplay {
        #[arg(long, default_value_t = 6)]
        rows: usize,
        #[arg(long, default_value_t = 7)]
        cols: usize,
        #[arg(short, default_value_t = 4)]
        k: usize,
        /// Number of random blocked cells
        #[arg(long, default_value_t = 0)]
        blocked_count: usize,
    },
    /// Run a short scripted demo
    Demo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.command {
        Some(Commands::Protocol) => {
            let mut engine = ProtocolEngine::with_settings(cli.depth, cli.seed);
            engine.run(std::io::stdin().lock(), std::io::stdout())
        }
        Some(Commands::Analyze {
            rows,
            cols,
            k,
            blocked,
            moves,
        }) => run_analyze(rows, cols, k, &blocked, &moves, cli.depth),
        Some(Commands::Selfplay {
            rows,
            cols,
            k,
            blocked_count,
        }) => {
            let config = GameConfig {
                rows,
                cols,
                k,
                depth: cli.depth,
                mode: Mode::AiAi,
                blocked: BlockedCells::Random(blocked_count),
                seed: cli.seed,
            };
            run_selfplay(&config)
        }
        Some(Commands::Demo) | None => run_demo(cli.depth),
    }
}

fn run_analyze(
    rows: usize,
    cols: usize,
    k: usize,
    blocked: &[String],
    moves: &[usize],
    depth: u32,
) -> Result<()> {
    let params = GameParams::new(rows, cols, k)?;
    let blocked = blocked
        .iter()
        .map(|s| parse_cell(s))
        .collect::<Result<Vec<_>>>()?;
    let mut board = Board::new(params, blocked);

    let mut player = Player::One;
    for (i, &col) in moves.iter().enumerate() {
        if !board.is_legal(col) {
            bail!("move {} (column {col}) is not legal", i + 1);
        }
        let row = board
            .place(col, player)
            .with_context(|| format!("column {col} is full"))?;
        if board.check_win(row, col, player) {
            println!("{board}");
            println!("Player {player} won with move {} (column {col})", i + 1);
            return Ok(());
        }
        player = player.other();
    }

    println!("{board}");
    println!("Evaluation: {}", board.evaluate());
    if board.check_draw() {
        println!("Draw: no legal moves");
        return Ok(());
    }
    let result = search(&board, depth, player);
    match result.best_move {
        Some(col) => println!(
            "Player {player} to move: best column {col}, value {} ({} nodes)",
            result.value, result.nodes
        ),
        None => println!("Player {player} has no legal move"),
    }
    Ok(())
}

fn run_selfplay(config: &GameConfig) -> Result<()> {
    let mut session = GameSession::new(config)?;
    println!("{}", session.board());
    while !session.status().is_over() {
        let outcome = session.ai_move()?;
        println!(
            "Player {} -> column {} (row {})",
            outcome.player, outcome.column, outcome.row
        );
    }
    println!("\n{}", session.board());
    match session.status().winner() {
        Some(p) => println!("Player {p} wins"),
        None => println!("Draw"),
    }
    Ok(())
}

fn run_demo(depth: u32) -> Result<()> {
    println!("Connect-K: gravity drop, blocked cells, alpha-beta search\n");

    // Demo 1: Gravity with a blocked cell
    println!("=== Board Demo ===");
    let params = GameParams::new(5, 6, 3)?;
    let mut board = Board::new(params, [(4, 2)]);
    let r1 = board.place(2, Player::One);
    let r2 = board.place(1, Player::Two);
    println!("Player 1 in column 2 lands on row {r1:?}");
    println!("Player 2 in column 1 lands on row {r2:?}");
    println!("{board}");

    // Demo 2: Engine move
    println!("=== Search Demo ===");
    let mut session = GameSession::new(&GameConfig {
        rows: 5,
        cols: 6,
        k: 3,
        depth,
        mode: Mode::HumanAi,
        blocked: BlockedCells::List(vec![(4, 2)]),
        seed: None,
    })?;
    session.play(3)?;
    let outcome = session.ai_move()?;
    println!(
        "Engine (player {}) answers in column {}",
        outcome.player, outcome.column
    );
    println!("Evaluation: {}", session.board().evaluate());
    println!("{}", session.board());
    Ok(())
}
