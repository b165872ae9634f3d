//! Command-line front end
//!
//! `best` answers one position; `play` runs the engine against itself.
//! Set `RUST_LOG=gomoku6=debug` to see each search depth.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::info;

use gomoku6::{
    check_game_status, AIEngine, Board, CancelToken, DelayOutcome, EngineError, GameStatus, Mark,
    RuleConfig, SearchConfig, ThinkingDelay,
};

#[derive(Parser)]
#[command(name = "gomoku6", about = "Five-in-a-row engine with wrap, bounce and missing-teeth rules")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,

    #[command(flatten)]
    opts: Opts,
}

#[derive(Args)]
struct Opts {
    /// Lines continue across opposite edges
    #[arg(long, global = true)]
    wrap: bool,

    /// Diagonals reflect off the edges
    #[arg(long, global = true)]
    bounce: bool,

    /// Lines with a gap do not win (great diagonals exempt)
    #[arg(long, global = true)]
    missing_teeth: bool,

    /// Time budget per move in milliseconds
    #[arg(long, global = true)]
    budget_ms: Option<u64>,

    /// JSON search configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the engine's move for a position
    Best {
        /// Board rows such as `XXXX..`; read from stdin when omitted
        rows: Vec<String>,
        /// Side to move (X or O)
        #[arg(long, default_value = "X")]
        player: char,
    },
    /// Let the engine play both sides from an empty board
    Play {
        /// Board size
        #[arg(long, default_value_t = gomoku6::DEFAULT_BOARD_SIZE)]
        size: usize,
    },
}

impl Opts {
    fn rules(&self) -> RuleConfig {
        RuleConfig::new(self.bounce, self.wrap, self.missing_teeth)
    }

    fn search_config(&self) -> Result<SearchConfig, EngineError> {
        let mut config = match &self.config {
            Some(path) => SearchConfig::from_path(path)?,
            None => SearchConfig::default(),
        };
        if let Some(ms) = self.budget_ms {
            config.time_budget_ms = ms;
        }
        Ok(config)
    }
}

fn read_rows(rows: Vec<String>) -> Result<Vec<String>, EngineError> {
    if !rows.is_empty() {
        return Ok(rows);
    }
    let mut out = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            out.push(line.to_string());
        }
    }
    Ok(out)
}

fn best(opts: &Opts, rows: Vec<String>, player: char) -> Result<(), EngineError> {
    let board = Board::from_rows(&read_rows(rows)?)?;
    let player = Mark::from_symbol(player.to_ascii_uppercase())
        .filter(|m| m.is_player())
        .ok_or(EngineError::NotAPlayer(Mark::Empty))?;
    let rules = opts.rules();
    let mut engine = AIEngine::with_config(opts.search_config()?);

    let result = engine.try_get_move(&board, player, &rules)?;
    info!(
        "{:?} via {:?}: score {} depth {} nodes {} in {}ms",
        result.best_move, result.search_type, result.score, result.depth, result.nodes, result.time_ms
    );
    match result.best_move {
        Some(pos) => {
            println!("{} {}", pos.row, pos.col);
            print!("{}", board.with_mark(pos, player).render());
        }
        None => println!("no move: board is full"),
    }
    Ok(())
}

fn play(opts: &Opts, size: usize) -> Result<(), EngineError> {
    let mut board = Board::new_sized(size)?;
    let rules = opts.rules();
    let config = opts.search_config()?;
    let delay = ThinkingDelay::from_config(&config);
    let cancel = CancelToken::new();
    let mut engine = AIEngine::with_config(config);
    let mut player = Mark::X;

    loop {
        match check_game_status(&board, &rules) {
            GameStatus::Won(win) => {
                println!("{:?} wins ({:?}) along {:?}", win.winner, win.kind, win.cells);
                return Ok(());
            }
            GameStatus::Draw => {
                println!("draw");
                return Ok(());
            }
            GameStatus::InProgress => {}
        }

        let Some(pending) = engine.plan_move(&board, player, &rules)? else {
            println!("draw");
            return Ok(());
        };
        if delay.wait(&cancel) == DelayOutcome::Cancelled {
            return Ok(());
        }
        pending.commit(&mut board)?;
        info!("{:?} plays {}", player, pending.pos);
        println!("{:?} -> {}\n{}", player, pending.pos, board.render());
        player = player.opponent();
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let outcome = match cli.cmd {
        Cmd::Best { rows, player } => best(&cli.opts, rows, player),
        Cmd::Play { size } => play(&cli.opts, size),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
