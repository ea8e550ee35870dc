use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tilehop_input::ScriptedInput;
use tilehop_kernel::{GameState, GridState, MovingTileAnimator, SessionRng};
use tilehop_render::{RecordingRenderer, Renderer};
use tilehop_session::{GameLoop, SessionConfig, SessionError, SessionOutcome};
use tilehop_tools::{BoardInspector, BoardSummary};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tilehop-cli", about = "Inspect tilehop boards and play scripted sessions")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Generate a board and print it
    Board {
        /// RNG seed for the board
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Play a move script headlessly, e.g. "R R ^U U @top Q"
    Play {
        /// Move script: U D L R, ^X jump, `.` idle, Q quit, @mode camera
        #[arg(short, long)]
        moves: String,
        /// RNG seed (overrides the config file)
        #[arg(short, long)]
        seed: Option<u64>,
        /// Session config file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Play on a board with no holes, obstacles or moving tiles
        #[arg(long)]
        open: bool,
        /// Simulated milliseconds per tick
        #[arg(long, default_value = "16", value_parser = clap::value_parser!(u64).range(1..))]
        step_ms: u64,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct BoardReport<'a> {
    summary: BoardSummary,
    holes: &'a [i32],
    obstacles: &'a [i32],
    moving_tiles: &'a [i32],
}

#[derive(Serialize)]
struct PlayReport {
    outcome: SessionOutcome,
    board: BoardSummary,
    frames_drawn: u64,
}

fn start_session<R: Renderer + ?Sized>(
    config: &SessionConfig,
    open: bool,
    renderer: &mut R,
) -> Result<GameLoop, SessionError> {
    if !open {
        return GameLoop::from_config(config, renderer);
    }
    // Respawns still draw obstacles after the first interval.
    let seed = config
        .seed
        .unwrap_or_else(|| SessionRng::from_time().next_u64());
    let state = GameState::with_grid(GridState::default(), seed)
        .with_animator(MovingTileAnimator::new(config.bounce_rate));
    GameLoop::new(state, config, renderer)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info => {
            println!("tilehop-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", tilehop_common::crate_info());
            println!("kernel: {}", tilehop_kernel::crate_info());
            println!("input: {}", tilehop_input::crate_info());
            println!("render: {}", tilehop_render::crate_info());
            println!("session: {}", tilehop_session::crate_info());
            println!("tools: {}", tilehop_tools::crate_info());
        }
        Commands::Board { seed, json } => {
            let state = GameState::new(seed);
            let grid = state.grid();
            if json {
                let report = BoardReport {
                    summary: BoardInspector::summary(&state),
                    holes: grid.holes(),
                    obstacles: grid.obstacles(),
                    moving_tiles: grid.moving_tiles(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", BoardInspector::summary(&state));
                print!("{}", BoardInspector::ascii(&state));
            }
        }
        Commands::Play {
            moves,
            seed,
            config,
            open,
            step_ms,
            json,
        } => {
            let mut session = match config {
                Some(path) => SessionConfig::load(&path)?,
                None => SessionConfig::default(),
            };
            if seed.is_some() {
                session.seed = seed;
            }

            let mut input = ScriptedInput::parse_moves(&moves)?;
            let mut renderer = RecordingRenderer::new();
            let mut game = start_session(&session, open, &mut renderer)?;
            let outcome = game.run(&mut input, &mut renderer, Duration::from_millis(step_ms))?;

            for event in game.state_mut().drain_events() {
                tracing::debug!(?event, "game event");
            }

            if json {
                let report = PlayReport {
                    outcome,
                    board: BoardInspector::summary(game.state()),
                    frames_drawn: renderer.frames_presented(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", BoardInspector::ascii(game.state()));
                println!("{outcome}");
            }
        }
    }

    Ok(())
}
