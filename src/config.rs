//! Command-line configuration.

use clap::{ArgAction, Args};

use crate::constants::{DEFAULT_AI_ATTEMPTS, DEFAULT_KOMI, DEFAULT_SIZE, SUPPORTED_SIZES};
use crate::offline::OfflineService;
use crate::session::GameSession;

/// Settings shared by every subcommand.
#[derive(Debug, Clone, Args)]
pub struct EngineConfig {
    /// Board size (19, 13 or 9)
    #[arg(long, default_value_t = DEFAULT_SIZE, value_parser = parse_size)]
    pub size: usize,

    /// Points added to White's score
    #[arg(long, default_value_t = DEFAULT_KOMI, allow_negative_numbers = true)]
    pub komi: f64,

    /// Seed for the offline opponent (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Candidate points the opponent may try per move
    #[arg(long, default_value_t = DEFAULT_AI_ATTEMPTS)]
    pub attempts: u32,

    /// Increase log verbosity (-v debug, -vv trace); overrides RUST_LOG
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            komi: DEFAULT_KOMI,
            seed: None,
            attempts: DEFAULT_AI_ATTEMPTS,
            verbose: 0,
        }
    }
}

impl EngineConfig {
    pub fn new_session(&self) -> GameSession {
        GameSession::new(self.size, self.komi)
    }

    pub fn new_service(&self, size: usize) -> OfflineService {
        match self.seed {
            Some(seed) => OfflineService::with_seed(size, seed),
            None => OfflineService::new(size),
        }
    }

    /// Log filter implied by `-v`, or `None` to defer to the environment.
    pub fn log_filter(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}

/// Accept only the sizes a session can be created with.
pub fn parse_size(s: &str) -> Result<usize, String> {
    let size: usize = s.parse().map_err(|_| format!("invalid board size '{s}'"))?;
    if SUPPORTED_SIZES.contains(&size) {
        Ok(size)
    } else {
        Err(format!("unsupported board size {size}, expected one of {SUPPORTED_SIZES:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("19"), Ok(19));
        assert_eq!(parse_size("9"), Ok(9));
        assert!(parse_size("11").is_err());
        assert!(parse_size("big").is_err());
    }

    #[test]
    fn test_log_filter() {
        let mut config = EngineConfig::default();
        assert_eq!(config.log_filter(), None);
        config.verbose = 1;
        assert_eq!(config.log_filter(), Some("debug"));
        config.verbose = 3;
        assert_eq!(config.log_filter(), Some("trace"));
    }

    #[test]
    fn test_new_session_uses_settings() {
        let config = EngineConfig {
            size: 13,
            komi: 6.5,
            ..EngineConfig::default()
        };
        let session = config.new_session();
        assert_eq!(session.size(), 13);
        assert_eq!(session.komi(), 6.5);
    }
}
