//! Goban-Engine: a Go rules engine with an offline opponent.
//!
//! ## Usage
//!
//! - `goban-engine` - Show a demo
//! - `goban-engine play` - Start the text protocol on stdin/stdout
//! - `goban-engine --size 9 -v play` - Same, on a 9x9 board with debug logs

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use goban_engine::board::{Point, format_vertex};
use goban_engine::config::EngineConfig;
use goban_engine::protocol::ProtocolEngine;
use goban_engine::remote::RemoteError;

/// Goban-Engine: Go rules engine
#[derive(Parser)]
#[command(name = "goban-engine")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: EngineConfig,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the text protocol for use with front ends
    Play,
    /// Play a short game against the offline opponent and score it
    Demo,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.config);

    match cli.command {
        Some(Commands::Play) => {
            let mut engine = ProtocolEngine::new(cli.config);
            engine.run()?;
        }
        Some(Commands::Demo) | None => run_demo(&cli.config)?,
    }
    Ok(())
}

/// Logs go to stderr so stdout stays clean for the protocol.
fn init_logging(config: &EngineConfig) {
    let filter = match config.log_filter() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_demo(config: &EngineConfig) -> Result<()> {
    println!("Goban-Engine: Go rules engine\n");

    let mut session = config.new_session();
    let mut service = config.new_service(config.size);
    session.request_new_game(&mut service, "demo", false)?;

    let size = session.size();
    let opening = [(3, 3), (size - 4, size - 4), (size - 4, 3), (3, size - 4)];
    for (x, y) in opening {
        let mover = session.current_player();
        let vertex = format_vertex(Point::new(x, y), size);
        if let Err(e) = session.place_stone(x, y) {
            println!("{mover} cannot play {vertex}: {e}");
            continue;
        }
        println!("{mover} plays {vertex}");

        let mover = session.current_player();
        match session.request_ai_move(&mut service, config.attempts) {
            Ok(()) => {
                if let Some(entry) = session.history().last().filter(|e| e.color == mover) {
                    println!("{mover} plays {}", format_vertex(entry.point, size));
                }
            }
            Err(RemoteError::AiDeclined) => println!("{mover} passes"),
            Err(e) => return Err(e.into()),
        }
    }

    println!("\n{}", session.board());
    println!("{}", session.determine_winner());
    Ok(())
}
