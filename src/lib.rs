//! Goban-Engine: rules engine for the game of Go.
//!
//! This crate provides the board rules for a two-player Go client: stone
//! placement with capture resolution, undo, area scoring, and the boundary
//! through which a remote opponent and influence analyzer update the game.
//!
//! ## Modules
//!
//! - [`constants`] - Default sizes, komi, and wire codes
//! - [`board`] - Flat board storage and coordinate mapping
//! - [`group`] - Liberty counting and capture removal
//! - [`history`] - Move log used for undo
//! - [`score`] - Area scoring
//! - [`session`] - A game session: moves, undo, remote synchronization
//! - [`remote`] - Wire types, payload sanitization, JSON service client
//! - [`offline`] - Local opponent and influence analyzer
//! - [`config`] - Command-line configuration
//! - [`protocol`] - Text command loop
//!
//! ## Example
//!
//! ```
//! use goban_engine::board::Stone;
//! use goban_engine::session::GameSession;
//!
//! let mut session = GameSession::new(19, 7.5);
//! session.place_stone(3, 3).unwrap();
//! assert_eq!(session.stone_at(3, 3), Stone::Black);
//! assert_eq!(session.current_player(), Stone::White);
//!
//! let score = session.determine_winner();
//! println!("{}", score.outcome);
//! ```

pub mod board;
pub mod config;
pub mod constants;
pub mod group;
pub mod history;
pub mod offline;
pub mod protocol;
pub mod remote;
pub mod score;
pub mod session;
