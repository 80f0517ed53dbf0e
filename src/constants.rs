//! Defaults for board dimensions, scoring, and the remote exchange.
//!
//! Board size is a runtime property of a session rather than a build-time
//! choice; these values only seed a new session or the command line.

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size used by the online-play path.
pub const DEFAULT_SIZE: usize = 19;

/// Board sizes a session may be created with. 13 and 9 are offline-only.
pub const SUPPORTED_SIZES: [usize; 3] = [19, 13, 9];

// =============================================================================
// Scoring
// =============================================================================

/// Compensation added to White's area score.
pub const DEFAULT_KOMI: f64 = 7.5;

// =============================================================================
// Remote Exchange
// =============================================================================

/// Attempt budget forwarded with an AI move request when the caller gives none.
pub const DEFAULT_AI_ATTEMPTS: u32 = 10;

/// Maximum Manhattan distance a stone projects influence in the offline analyzer.
pub const INFLUENCE_RADIUS: usize = 3;

// =============================================================================
// Wire Codes
// =============================================================================

/// Wire value of an empty point.
pub const WIRE_EMPTY: u8 = 0;

/// Wire value of a black stone.
pub const WIRE_BLACK: u8 = 1;

/// Wire value of a white stone.
pub const WIRE_WHITE: u8 = 2;
