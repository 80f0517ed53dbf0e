//! Line-oriented text protocol in the style of GTP version 2.
//!
//! Each command may carry a numeric id. Successful responses start with `=`,
//! failures with `?`, and every response ends with a blank line. The
//! opponent for `genmove` and the analyzer for `influence` are the
//! [`OfflineService`].
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`, `list_commands`, `known_command`, `quit`
//! - `boardsize <size>` - Start a new game on a 19, 13 or 9 board
//! - `clear_board` - Start a new game on the current size
//! - `komi <value>` - Set komi
//! - `play [color] <vertex>` - Play for the side to move
//! - `genmove [color]` - Let the opponent move for the side to move
//! - `undo` - Take back the last move
//! - `showboard` - Print the board
//! - `final_score` - Score as `B+n`, `W+n` or `0`
//! - `score` - Full area-score breakdown
//! - `influence` - Print the influence overlay

use std::io::{self, BufRead, Write};

use tracing::{debug, warn};

use crate::board::{Stone, format_vertex, parse_vertex};
use crate::config::{EngineConfig, parse_size};
use crate::offline::OfflineService;
use crate::remote::RemoteError;
use crate::score::Outcome;
use crate::session::GameSession;

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "boardsize",
    "clear_board",
    "final_score",
    "genmove",
    "influence",
    "known_command",
    "komi",
    "list_commands",
    "name",
    "play",
    "protocol_version",
    "quit",
    "score",
    "showboard",
    "undo",
    "version",
];

/// Name used when registering games with the service.
const PLAYER_NAME: &str = "protocol";

/// Protocol front end owning one session and its opponent.
pub struct ProtocolEngine {
    session: GameSession,
    service: OfflineService,
    config: EngineConfig,
}

impl ProtocolEngine {
    /// Create an engine and register its first game with the opponent.
    pub fn new(config: EngineConfig) -> Self {
        let mut engine = Self {
            session: config.new_session(),
            service: config.new_service(config.size),
            config,
        };
        engine.start_game();
        engine
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    fn start_game(&mut self) {
        if let Err(e) = self
            .session
            .request_new_game(&mut self.service, PLAYER_NAME, false)
        {
            warn!(error = %e, "could not register game with opponent");
        }
    }

    /// Run the command loop on stdin and stdout.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run_with<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
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
            let (success, message) = self.execute(&command, &parts[1..]);

            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command id from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        match trimmed[..end].parse::<u32>() {
            Ok(id) => (Some(id), trimmed[end..].trim()),
            Err(_) => (None, trimmed),
        }
    }

    fn parse_color(s: &str) -> Option<Stone> {
        match s.to_lowercase().as_str() {
            "b" | "black" => Some(Stone::Black),
            "w" | "white" => Some(Stone::White),
            _ => None,
        }
    }

    /// Check an optional color argument against the side to move.
    fn check_color(&self, arg: Option<&str>) -> Result<(), String> {
        let Some(arg) = arg else {
            return Ok(());
        };
        match Self::parse_color(arg) {
            Some(c) if c == self.session.current_player() => Ok(()),
            Some(c) => Err(format!("{c} is not to move")),
            None => Err("invalid color".to_string()),
        }
    }

    /// Execute a command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        debug!(command, ?args, "protocol command");
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, "2".to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.contains(&arg.to_lowercase().as_str());
                (true, known.to_string())
            }

            "quit" => (true, String::new()),

            "boardsize" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                match parse_size(arg) {
                    Ok(size) => self.new_game(size),
                    Err(e) => (false, e),
                }
            }

            "clear_board" => self.new_game(self.session.size()),

            "komi" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                match arg.parse::<f64>() {
                    Ok(komi) if komi.is_finite() => {
                        self.session.set_komi(komi);
                        (true, String::new())
                    }
                    _ => (false, "invalid komi".to_string()),
                }
            }

            "play" => {
                let (color, vertex) = match args {
                    [vertex] => (None, *vertex),
                    [color, vertex, ..] => (Some(*color), *vertex),
                    [] => return (false, "missing arguments".to_string()),
                };
                if let Err(e) = self.check_color(color) {
                    return (false, e);
                }
                let Some(p) = parse_vertex(vertex, self.session.size()) else {
                    return (false, "invalid vertex".to_string());
                };
                match self.session.place_stone(p.x, p.y) {
                    Ok(_) => (true, String::new()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "genmove" => {
                if let Err(e) = self.check_color(args.first().copied()) {
                    return (false, e);
                }
                let mover = self.session.current_player();
                match self
                    .session
                    .request_ai_move(&mut self.service, self.config.attempts)
                {
                    Ok(()) => match self.session.history().last() {
                        Some(entry) if entry.color == mover => {
                            (true, format_vertex(entry.point, self.session.size()))
                        }
                        _ => (true, String::new()),
                    },
                    Err(RemoteError::AiDeclined) => (true, "pass".to_string()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "undo" => match self.session.undo() {
                Ok(Some(_)) => (true, String::new()),
                Ok(None) => (false, "cannot undo".to_string()),
                Err(e) => (false, e.to_string()),
            },

            "showboard" => (true, format!("\n{}", self.session.board())),

            "final_score" => {
                let result = self.session.determine_winner();
                let text = match result.outcome {
                    Outcome::Draw => "0".to_string(),
                    Outcome::Win { winner, margin } => {
                        let side = if winner == Stone::Black { 'B' } else { 'W' };
                        format!("{side}+{margin}")
                    }
                };
                (true, text)
            }

            "score" => (true, format!("\n{}", self.session.determine_winner())),

            "influence" => match self.session.request_influence(&mut self.service) {
                Ok(()) => {
                    let Some(influence) = self.session.influence() else {
                        return (false, "no influence available".to_string());
                    };
                    let size = influence.size();
                    let rows: Vec<String> = influence
                        .values()
                        .chunks(size)
                        .map(|row| {
                            row.iter()
                                .map(|v| format!("{v:>3}"))
                                .collect::<Vec<_>>()
                                .join("")
                        })
                        .collect();
                    (true, format!("\n{}", rows.join("\n")))
                }
                Err(e) => (false, e.to_string()),
            },

            _ => (false, format!("unknown command: {command}")),
        }
    }

    fn new_game(&mut self, size: usize) -> (bool, String) {
        if let Err(e) = self.session.reset(size) {
            return (false, e.to_string());
        }
        if size != self.service.size() {
            self.service = self.config.new_service(size);
        }
        self.start_game();
        (true, String::new())
    }
}
