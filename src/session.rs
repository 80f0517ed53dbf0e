//! A single game: board, history, side to move, and the remote-sync state.
//!
//! All mutation goes through [`GameSession`]. Every committed change bumps
//! [`GameSession::version`], which a renderer can poll instead of reaching into
//! the board.
//!
//! Remote exchanges come in two halves. `begin_*` snapshots the request and
//! marks the session busy; `finish_*` releases it and applies the response if
//! it is valid. While a call is outstanding local moves, undo, and reset are
//! refused. The `request_*` helpers run both halves around a blocking
//! [`GameService`].

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::board::{Board, Point, Stone, format_vertex};
use crate::constants::{DEFAULT_KOMI, DEFAULT_SIZE, SUPPORTED_SIZES};
use crate::group::{liberties, remove_captured_stones};
use crate::history::{History, HistoryEntry};
use crate::remote::{
    AiMoveRequest, AiMoveResponse, CreateGameRequest, CreateGameResponse, EndGameRequest,
    GameService, InfluenceBoard, InfluenceRequest, InfluenceResponse, RemoteError, sanitize_board,
    sanitize_influence, sanitize_player,
};
use crate::score::{ScoreResult, determine_winner};

/// Why a local move was refused. The board is untouched in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("illegal move: point not empty")]
    Occupied,
    #[error("illegal move: suicide")]
    Suicide,
    #[error("a remote call is in flight")]
    Busy,
    #[error("unsupported board size {0}")]
    UnsupportedSize(usize),
}

/// Summary of an accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub color: Stone,
    pub captured: usize,
}

/// Which remote exchange a [`PendingCall`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    NewGame,
    AiMove,
    Influence,
    EndGame,
}

/// Token for an outstanding remote call. Hand it back to the matching
/// `finish_*` method, or to [`GameSession::abort`], to release the session.
#[must_use = "the session stays busy until the call is finished or aborted"]
#[derive(Debug)]
pub struct PendingCall {
    kind: CallKind,
}

impl PendingCall {
    pub fn kind(&self) -> CallKind {
        self.kind
    }
}

pub struct GameSession {
    board: Board,
    history: History,
    current_player: Stone,
    komi: f64,
    game_id: Option<String>,
    influence: Option<InfluenceBoard>,
    version: u64,
    in_flight: Option<CallKind>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE, DEFAULT_KOMI)
    }
}

impl GameSession {
    /// Start an empty game with Black to move.
    ///
    /// Callers pick `size`; [`crate::config::parse_size`] accepts only the
    /// sizes in [`SUPPORTED_SIZES`]. Panics if `size` is 0.
    pub fn new(size: usize, komi: f64) -> Self {
        Self::from_snapshot(Board::new(size), Stone::Black, komi)
    }

    /// Start from an existing position with no history.
    pub fn from_snapshot(board: Board, current_player: Stone, komi: f64) -> Self {
        assert!(!current_player.is_empty(), "side to move must be Black or White");
        Self {
            board,
            history: History::new(),
            current_player,
            komi,
            game_id: None,
            influence: None,
            version: 0,
            in_flight: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn size(&self) -> usize {
        self.board.size()
    }

    pub fn index(&self, x: usize, y: usize) -> usize {
        self.board.index(x, y)
    }

    pub fn stone_at(&self, x: usize, y: usize) -> Stone {
        self.board.stone_at(x, y)
    }

    pub fn current_player(&self) -> Stone {
        self.current_player
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn komi(&self) -> f64 {
        self.komi
    }

    pub fn set_komi(&mut self, komi: f64) {
        self.komi = komi;
    }

    pub fn game_id(&self) -> Option<&str> {
        self.game_id.as_deref()
    }

    pub fn influence(&self) -> Option<&InfluenceBoard> {
        self.influence.as_ref()
    }

    /// Incremented after every committed change to the board, history,
    /// side to move, or influence overlay.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The remote call currently outstanding, if any.
    pub fn in_flight(&self) -> Option<CallKind> {
        self.in_flight
    }

    fn changed(&mut self) {
        self.version += 1;
    }

    /// Place a stone for the side to move at `(x, y)`.
    ///
    /// The suicide test looks at the new stone's group before any capture is
    /// resolved, so filling the last liberty of an enemy group is refused
    /// when the placed stone has no empty neighbor of its own.
    pub fn place_stone(&mut self, x: usize, y: usize) -> Result<MoveOutcome, MoveError> {
        if self.in_flight.is_some() {
            return Err(MoveError::Busy);
        }
        let idx = self.board.index(x, y);
        if !self.board.get(idx).is_empty() {
            return Err(MoveError::Occupied);
        }

        let color = self.current_player;
        self.board.set(idx, color);
        if liberties(&self.board, idx) == 0 {
            self.board.set(idx, Stone::Empty);
            return Err(MoveError::Suicide);
        }

        let opp = color.opponent();
        let neighbors: Vec<usize> = self.board.neighbors(idx).collect();
        let mut captured = Vec::new();
        for n in neighbors {
            if self.board.get(n) == opp && liberties(&self.board, n) == 0 {
                captured.extend(remove_captured_stones(&mut self.board, n));
            }
        }

        debug!(
            vertex = %format_vertex(Point::new(x, y), self.size()),
            %color,
            captured = captured.len(),
            "stone placed"
        );
        let outcome = MoveOutcome {
            color,
            captured: captured.len(),
        };
        self.history.push(HistoryEntry {
            point: Point::new(x, y),
            color,
            captured,
        });
        self.current_player = opp;
        self.changed();
        Ok(outcome)
    }

    /// Take back the most recent move. Returns `Ok(None)` when there is none.
    pub fn undo(&mut self) -> Result<Option<HistoryEntry>, MoveError> {
        if self.in_flight.is_some() {
            return Err(MoveError::Busy);
        }
        let Some(entry) = self.history.pop() else {
            return Ok(None);
        };

        let idx = self.board.index(entry.point.x, entry.point.y);
        self.board.set(idx, Stone::Empty);
        let restored = entry.color.opponent();
        for &c in &entry.captured {
            self.board.set(c, restored);
        }
        self.current_player = entry.color;
        debug!(
            vertex = %format_vertex(entry.point, self.size()),
            restored = entry.captured.len(),
            "move undone"
        );
        self.changed();
        Ok(Some(entry))
    }

    /// Replace the game with an empty board of `size`, Black to move.
    ///
    /// Drops history, game id, and influence. Komi is kept. Only sizes in
    /// [`SUPPORTED_SIZES`] are accepted.
    pub fn reset(&mut self, size: usize) -> Result<(), MoveError> {
        if self.in_flight.is_some() {
            return Err(MoveError::Busy);
        }
        if !SUPPORTED_SIZES.contains(&size) {
            return Err(MoveError::UnsupportedSize(size));
        }
        self.board = Board::new(size);
        self.history.clear();
        self.current_player = Stone::Black;
        self.game_id = None;
        self.influence = None;
        self.changed();
        Ok(())
    }

    /// Area score of the current position.
    pub fn determine_winner(&self) -> ScoreResult {
        determine_winner(&self.board, self.komi)
    }

    // =========================================================================
    // Remote synchronization
    // =========================================================================

    fn begin(&mut self, kind: CallKind) -> Result<PendingCall, RemoteError> {
        if self.in_flight.is_some() {
            return Err(RemoteError::Busy);
        }
        self.in_flight = Some(kind);
        Ok(PendingCall { kind })
    }

    /// Clear the guard held by `call`. A token finished by the wrong handler
    /// still clears it, but its response is discarded.
    fn release(&mut self, call: PendingCall, handler: CallKind) -> Result<(), RemoteError> {
        if self.in_flight != Some(call.kind) {
            return Err(RemoteError::NotPending(call.kind));
        }
        self.in_flight = None;
        if call.kind != handler {
            warn!(call = ?call.kind, handler = ?handler, "pending call finished as the wrong kind");
            return Err(RemoteError::WrongHandler {
                call: call.kind,
                handler,
            });
        }
        Ok(())
    }

    /// Give up on an outstanding call without applying any response.
    pub fn abort(&mut self, call: PendingCall) -> Result<(), RemoteError> {
        let kind = call.kind;
        self.release(call, kind)?;
        debug!(?kind, "remote call aborted");
        Ok(())
    }

    pub fn begin_new_game(
        &mut self,
        name: &str,
        ai_first: bool,
    ) -> Result<(PendingCall, CreateGameRequest), RemoteError> {
        let call = self.begin(CallKind::NewGame)?;
        let req = CreateGameRequest {
            name: name.to_string(),
            ai_first,
        };
        Ok((call, req))
    }

    /// Adopt a freshly created remote game. History and influence are cleared.
    pub fn finish_new_game(
        &mut self,
        call: PendingCall,
        response: Result<CreateGameResponse, RemoteError>,
    ) -> Result<(), RemoteError> {
        self.release(call, CallKind::NewGame)?;
        let resp = response?;
        let board = sanitize_board(&resp.board, self.size())?;
        let player = sanitize_player(&resp.current_player)?;

        info!(game_id = %resp.game_id, to_move = %player, "remote game created");
        self.board = board;
        self.current_player = player;
        self.game_id = Some(resp.game_id);
        self.history.clear();
        self.influence = None;
        self.changed();
        Ok(())
    }

    pub fn begin_ai_move(
        &mut self,
        attempts: u32,
    ) -> Result<(PendingCall, AiMoveRequest), RemoteError> {
        let game_id = self.game_id.clone().ok_or(RemoteError::NoGame)?;
        let call = self.begin(CallKind::AiMove)?;
        let req = AiMoveRequest {
            board: self.board.to_wire(),
            game_id,
            current_player: self.current_player.to_wire(),
            ai_attempts: attempts,
        };
        Ok((call, req))
    }

    /// Apply the service's move. On any failure the session is unchanged.
    ///
    /// When the new snapshot is explained by one stone of the side to move
    /// plus captures, the move is added to the history so it can be undone.
    pub fn finish_ai_move(
        &mut self,
        call: PendingCall,
        response: Result<AiMoveResponse, RemoteError>,
    ) -> Result<(), RemoteError> {
        self.release(call, CallKind::AiMove)?;
        let resp = response?;
        if !resp.success {
            info!("remote service declined to move");
            return Err(RemoteError::AiDeclined);
        }
        let board = sanitize_board(&resp.board, self.size())?;
        let player = sanitize_player(&resp.current_player)?;

        let mover = self.current_player;
        let tracked = self.history.record_remote(&self.board, &board, mover);
        info!(%mover, tracked, "remote move applied");
        self.board = board;
        self.current_player = player;
        self.changed();
        Ok(())
    }

    pub fn begin_influence(&mut self) -> Result<(PendingCall, InfluenceRequest), RemoteError> {
        let call = self.begin(CallKind::Influence)?;
        let req = InfluenceRequest {
            board: self.board.to_wire(),
        };
        Ok((call, req))
    }

    /// Replace the influence overlay. The board and history are never touched.
    pub fn finish_influence(
        &mut self,
        call: PendingCall,
        response: Result<InfluenceResponse, RemoteError>,
    ) -> Result<(), RemoteError> {
        self.release(call, CallKind::Influence)?;
        let resp = response?;
        let influence = sanitize_influence(&resp.influence, self.size())?;
        self.influence = Some(influence);
        self.changed();
        Ok(())
    }

    pub fn begin_end_game(&mut self) -> Result<(PendingCall, EndGameRequest), RemoteError> {
        let game_id = self.game_id.clone().ok_or(RemoteError::NoGame)?;
        let call = self.begin(CallKind::EndGame)?;
        let req = EndGameRequest {
            board: self.board.to_wire(),
            game_id,
        };
        Ok((call, req))
    }

    pub fn finish_end_game(
        &mut self,
        call: PendingCall,
        response: Result<(), RemoteError>,
    ) -> Result<(), RemoteError> {
        self.release(call, CallKind::EndGame)?;
        response
    }

    /// Create a game on `service` and adopt its initial position.
    pub fn request_new_game<S: GameService + ?Sized>(
        &mut self,
        service: &mut S,
        name: &str,
        ai_first: bool,
    ) -> Result<(), RemoteError> {
        let (call, req) = self.begin_new_game(name, ai_first)?;
        let resp = service.create_game(&req);
        self.finish_new_game(call, resp)
    }

    /// Ask `service` to move for the side to move, forwarding `attempts`.
    pub fn request_ai_move<S: GameService + ?Sized>(
        &mut self,
        service: &mut S,
        attempts: u32,
    ) -> Result<(), RemoteError> {
        let (call, req) = self.begin_ai_move(attempts)?;
        let resp = service.ai_move(&req);
        self.finish_ai_move(call, resp)
    }

    pub fn request_influence<S: GameService + ?Sized>(
        &mut self,
        service: &mut S,
    ) -> Result<(), RemoteError> {
        let (call, req) = self.begin_influence()?;
        let resp = service.analyze_influence(&req);
        self.finish_influence(call, resp)
    }

    /// Report the final board to `service`.
    pub fn report_end_game<S: GameService + ?Sized>(
        &mut self,
        service: &mut S,
    ) -> Result<(), RemoteError> {
        let (call, req) = self.begin_end_game()?;
        let resp = service.end_game(&req);
        self.finish_end_game(call, resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn wire(board: &Board) -> Vec<Value> {
        board.to_wire().into_iter().map(Value::from).collect()
    }

    #[test]
    fn test_new_session() {
        let session = GameSession::default();
        assert_eq!(session.size(), 19);
        assert_eq!(session.current_player(), Stone::Black);
        assert_eq!(session.komi(), 7.5);
        assert!(session.history().is_empty());
        assert_eq!(session.version(), 0);
    }

    #[test]
    fn test_place_stone_alternates() {
        let mut session = GameSession::new(9, 7.5);
        let outcome = session.place_stone(2, 2).unwrap();
        assert_eq!(outcome.color, Stone::Black);
        assert_eq!(session.current_player(), Stone::White);
        session.place_stone(3, 3).unwrap();
        assert_eq!(session.stone_at(3, 3), Stone::White);
        assert_eq!(session.current_player(), Stone::Black);
        assert_eq!(session.version(), 2);
    }

    #[test]
    fn test_occupied_rejected_without_change() {
        let mut session = GameSession::new(9, 7.5);
        session.place_stone(4, 4).unwrap();
        let before = session.board().clone();
        let version = session.version();

        assert_eq!(session.place_stone(4, 4), Err(MoveError::Occupied));
        assert_eq!(session.board(), &before);
        assert_eq!(session.current_player(), Stone::White);
        assert_eq!(session.version(), version);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_suicide_rejected() {
        // Black at B1 and A2, White tries A1.
        let mut session = GameSession::new(9, 7.5);
        session.place_stone(1, 0).unwrap(); // B
        session.place_stone(8, 8).unwrap(); // W
        session.place_stone(0, 1).unwrap(); // B
        let before = session.board().clone();

        assert_eq!(session.place_stone(0, 0), Err(MoveError::Suicide));
        assert_eq!(session.board(), &before);
        assert_eq!(session.current_player(), Stone::White);
    }

    #[test]
    fn test_capture_checked_before_suicide_is_refused() {
        // White (1,0),(0,1) hold only the liberty (0,0); Black surrounds them
        // from outside. Filling (0,0) would capture both, but the placed stone
        // itself has no empty neighbor, so the move is refused.
        let board = {
            let mut b = Board::new(9);
            for (x, y) in [(2, 0), (1, 1), (0, 2)] {
                b.set(b.index(x, y), Stone::Black);
            }
            for (x, y) in [(1, 0), (0, 1)] {
                b.set(b.index(x, y), Stone::White);
            }
            b
        };
        let mut session = GameSession::from_snapshot(board.clone(), Stone::Black, 7.5);
        assert_eq!(session.place_stone(0, 0), Err(MoveError::Suicide));
        assert_eq!(session.board(), &board);
    }

    #[test]
    fn test_undo_empty_history_is_noop() {
        let mut session = GameSession::new(9, 7.5);
        assert_eq!(session.undo(), Ok(None));
        assert_eq!(session.version(), 0);
    }

    #[test]
    fn test_undo_restores_player_and_cell() {
        let mut session = GameSession::new(9, 7.5);
        session.place_stone(4, 4).unwrap();
        let entry = session.undo().unwrap().unwrap();
        assert_eq!(entry.color, Stone::Black);
        assert_eq!(session.stone_at(4, 4), Stone::Empty);
        assert_eq!(session.current_player(), Stone::Black);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut session = GameSession::new(19, 6.5);
        session.place_stone(0, 0).unwrap();
        session.reset(13).unwrap();
        assert_eq!(session.size(), 13);
        assert!(session.board().has_no_stones());
        assert!(session.history().is_empty());
        assert_eq!(session.current_player(), Stone::Black);
        assert_eq!(session.komi(), 6.5);
    }

    #[test]
    fn test_in_flight_guard_blocks_local_moves() {
        let mut session = GameSession::new(9, 7.5);
        let (call, req) = session.begin_influence().unwrap();
        assert_eq!(req.board.len(), 81);
        assert_eq!(session.in_flight(), Some(CallKind::Influence));

        assert_eq!(session.place_stone(0, 0), Err(MoveError::Busy));
        assert_eq!(session.undo(), Err(MoveError::Busy));
        assert_eq!(session.reset(9), Err(MoveError::Busy));
        assert!(matches!(session.begin_influence(), Err(RemoteError::Busy)));

        let resp = InfluenceResponse {
            board: vec![],
            influence: vec![json!(1); 81],
        };
        session.finish_influence(call, Ok(resp)).unwrap();
        assert_eq!(session.in_flight(), None);
        assert_eq!(session.influence().unwrap().at(3, 3), 1);
        assert!(session.place_stone(0, 0).is_ok());
    }

    #[test]
    fn test_failed_call_releases_guard_and_keeps_state() {
        let mut session = GameSession::new(9, 7.5);
        session.place_stone(4, 4).unwrap();
        let before = session.board().clone();

        let (call, _) = session.begin_influence().unwrap();
        let err = session
            .finish_influence(call, Err(RemoteError::Service("down".into())))
            .unwrap_err();
        assert!(matches!(err, RemoteError::Service(_)));
        assert_eq!(session.board(), &before);
        assert!(session.influence().is_none());
        assert_eq!(session.in_flight(), None);
    }

    #[test]
    fn test_wrong_handler_releases_guard_without_applying() {
        let mut session = GameSession::new(9, 7.5);
        let before = session.board().clone();

        let (call, _) = session.begin_influence().unwrap();
        let mut cells = vec![json!(0); 81];
        cells[0] = json!(2);
        let resp = AiMoveResponse {
            success: true,
            board: cells,
            current_player: json!(1),
        };
        let err = session.finish_ai_move(call, Ok(resp)).unwrap_err();
        assert!(matches!(
            err,
            RemoteError::WrongHandler {
                call: CallKind::Influence,
                handler: CallKind::AiMove
            }
        ));
        assert_eq!(session.board(), &before);
        assert_eq!(session.current_player(), Stone::Black);
        assert_eq!(session.in_flight(), None);
    }

    #[test]
    fn test_token_from_another_session_is_refused() {
        let mut first = GameSession::new(9, 7.5);
        let mut second = GameSession::new(9, 7.5);
        let (call, _) = first.begin_influence().unwrap();

        let err = second.abort(call).unwrap_err();
        assert!(matches!(err, RemoteError::NotPending(CallKind::Influence)));
        assert_eq!(second.in_flight(), None);
        assert_eq!(first.in_flight(), Some(CallKind::Influence));
    }

    #[test]
    fn test_abort_clears_guard() {
        let mut session = GameSession::new(9, 7.5);
        let (call, _) = session.begin_influence().unwrap();
        let version = session.version();
        session.abort(call).unwrap();
        assert_eq!(session.in_flight(), None);
        assert_eq!(session.version(), version);
        assert!(session.place_stone(4, 4).is_ok());
    }

    #[test]
    fn test_reset_rejects_unsupported_size() {
        let mut session = GameSession::new(9, 7.5);
        session.place_stone(4, 4).unwrap();
        let version = session.version();

        assert_eq!(session.reset(0), Err(MoveError::UnsupportedSize(0)));
        assert_eq!(session.reset(200), Err(MoveError::UnsupportedSize(200)));
        assert_eq!(session.size(), 9);
        assert_eq!(session.stone_at(4, 4), Stone::Black);
        assert_eq!(session.version(), version);
    }

    #[test]
    fn test_ai_move_requires_game_id() {
        let mut session = GameSession::new(9, 7.5);
        assert!(matches!(session.begin_ai_move(3), Err(RemoteError::NoGame)));
        assert_eq!(session.in_flight(), None);
    }

    #[test]
    fn test_finish_new_game_and_ai_move() {
        let mut session = GameSession::new(9, 7.5);
        let (call, req) = session.begin_new_game("carol", false).unwrap();
        assert_eq!(req.name, "carol");
        let created = CreateGameResponse {
            board: vec![json!(0); 81],
            current_player: json!(1),
            game_id: "g-1".into(),
        };
        session.finish_new_game(call, Ok(created)).unwrap();
        assert_eq!(session.game_id(), Some("g-1"));

        session.place_stone(4, 4).unwrap();
        let (call, req) = session.begin_ai_move(5).unwrap();
        assert_eq!(req.current_player, 2);
        assert_eq!(req.ai_attempts, 5);

        let mut after = session.board().clone();
        after.set(after.index(3, 3), Stone::White);
        let resp = AiMoveResponse {
            success: true,
            board: wire(&after),
            current_player: json!(1),
        };
        session.finish_ai_move(call, Ok(resp)).unwrap();
        assert_eq!(session.stone_at(3, 3), Stone::White);
        assert_eq!(session.current_player(), Stone::Black);
        assert_eq!(session.history().len(), 2);

        // The remote move is undoable like a local one.
        session.undo().unwrap();
        assert_eq!(session.stone_at(3, 3), Stone::Empty);
        assert_eq!(session.current_player(), Stone::White);
    }

    #[test]
    fn test_declined_ai_move_leaves_state() {
        let mut session = GameSession::new(9, 7.5);
        let (call, _) = session.begin_new_game("dave", false).unwrap();
        let created = CreateGameResponse {
            board: vec![json!(0); 81],
            current_player: json!(1),
            game_id: "g-2".into(),
        };
        session.finish_new_game(call, Ok(created)).unwrap();
        let version = session.version();

        let (call, _) = session.begin_ai_move(1).unwrap();
        let resp = AiMoveResponse {
            success: false,
            board: vec![json!(2); 81],
            current_player: json!(2),
        };
        assert!(matches!(
            session.finish_ai_move(call, Ok(resp)),
            Err(RemoteError::AiDeclined)
        ));
        assert!(session.board().has_no_stones());
        assert_eq!(session.version(), version);
    }

    #[test]
    fn test_wrong_length_snapshot_rejected() {
        let mut session = GameSession::new(19, 7.5);
        let (call, _) = session.begin_new_game("erin", true).unwrap();
        let created = CreateGameResponse {
            board: vec![json!(1); 81],
            current_player: json!(2),
            game_id: "g-3".into(),
        };
        assert!(matches!(
            session.finish_new_game(call, Ok(created)),
            Err(RemoteError::BoardLength { .. })
        ));
        assert!(session.board().has_no_stones());
        assert_eq!(session.game_id(), None);
    }
}
