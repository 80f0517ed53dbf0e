//! Local stand-in for the remote move and influence services.
//!
//! Moves are random legal points, skipping points whose every neighbor is a
//! stone of the mover (filling those only destroys the mover's own eyes).
//! Influence is a simple distance falloff around each stone.

use serde_json::Value;
use tracing::debug;

use crate::board::{Board, Stone};
use crate::constants::INFLUENCE_RADIUS;
use crate::remote::{
    AiMoveRequest, AiMoveResponse, CreateGameRequest, CreateGameResponse, GameService,
    InfluenceRequest, InfluenceResponse, RemoteError, sanitize_board, sanitize_player,
};
use crate::session::GameSession;

/// A [`GameService`] that answers on this machine.
pub struct OfflineService {
    rng: fastrand::Rng,
    size: usize,
}

impl OfflineService {
    pub fn new(size: usize) -> Self {
        Self {
            rng: fastrand::Rng::new(),
            size,
        }
    }

    /// Deterministic move choice for a given seed.
    pub fn with_seed(size: usize, seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Pick a legal move for `player`, trying at most `attempts` candidates.
    fn choose_move(&mut self, board: &Board, player: Stone, attempts: u32) -> Option<Board> {
        let mut candidates: Vec<usize> = (0..board.len())
            .filter(|&i| board.get(i).is_empty() && !is_own_eye(board, i, player))
            .collect();
        self.rng.shuffle(&mut candidates);

        for &pt in candidates.iter().take(attempts.max(1) as usize) {
            let mut scratch = GameSession::from_snapshot(board.clone(), player, 0.0);
            let p = board.point(pt);
            if scratch.place_stone(p.x, p.y).is_ok() {
                return Some(scratch.board().clone());
            }
        }
        None
    }
}

/// True when every neighbor of the empty point `pt` is a `color` stone.
fn is_own_eye(board: &Board, pt: usize, color: Stone) -> bool {
    board.neighbors(pt).all(|n| board.get(n) == color)
}

fn to_values(board: &Board) -> Vec<Value> {
    board.to_wire().into_iter().map(Value::from).collect()
}

/// Black-positive influence: each stone adds `radius + 1 - distance` to the
/// points within Manhattan `radius` of it.
pub fn estimate_influence(board: &Board, radius: usize) -> Vec<i32> {
    let size = board.size();
    let mut influence = vec![0i32; board.len()];
    for (i, &stone) in board.cells().iter().enumerate() {
        let sign = match stone {
            Stone::Black => 1,
            Stone::White => -1,
            Stone::Empty => continue,
        };
        let p = board.point(i);
        let (x0, x1) = (p.x.saturating_sub(radius), (p.x + radius).min(size - 1));
        let (y0, y1) = (p.y.saturating_sub(radius), (p.y + radius).min(size - 1));
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = x.abs_diff(p.x) + y.abs_diff(p.y);
                if d <= radius {
                    influence[board.index(x, y)] += sign * (radius + 1 - d) as i32;
                }
            }
        }
    }
    influence
}

impl GameService for OfflineService {
    fn create_game(&mut self, req: &CreateGameRequest) -> Result<CreateGameResponse, RemoteError> {
        let mut board = Board::new(self.size);
        let mut player = Stone::Black;
        if req.ai_first {
            if let Some(next) = self.choose_move(&board, player, u32::MAX) {
                board = next;
                player = Stone::White;
            }
        }
        let game_id = format!("offline-{:08x}", self.rng.u32(..));
        debug!(name = %req.name, %game_id, ai_first = req.ai_first, "offline game created");
        Ok(CreateGameResponse {
            board: to_values(&board),
            current_player: Value::from(player.to_wire()),
            game_id,
        })
    }

    fn ai_move(&mut self, req: &AiMoveRequest) -> Result<AiMoveResponse, RemoteError> {
        let raw: Vec<Value> = req.board.iter().map(|&c| Value::from(c)).collect();
        let board = sanitize_board(&raw, self.size)?;
        let player = sanitize_player(&Value::from(req.current_player))?;

        Ok(match self.choose_move(&board, player, req.ai_attempts) {
            Some(next) => AiMoveResponse {
                success: true,
                board: to_values(&next),
                current_player: Value::from(player.opponent().to_wire()),
            },
            None => AiMoveResponse {
                success: false,
                board: raw,
                current_player: Value::from(player.to_wire()),
            },
        })
    }

    fn analyze_influence(
        &mut self,
        req: &InfluenceRequest,
    ) -> Result<InfluenceResponse, RemoteError> {
        let raw: Vec<Value> = req.board.iter().map(|&c| Value::from(c)).collect();
        let board = sanitize_board(&raw, self.size)?;
        let influence = estimate_influence(&board, INFLUENCE_RADIUS)
            .into_iter()
            .map(Value::from)
            .collect();
        Ok(InfluenceResponse {
            board: raw,
            influence,
        })
    }
}
