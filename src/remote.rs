//! Boundary to the remote move-generation and influence services.
//!
//! Requests carry plain wire values. Responses are kept as raw
//! [`serde_json::Value`]s until [`sanitize_board`], [`sanitize_influence`] and
//! [`sanitize_player`] turn them into engine types, so a malformed payload can
//! never reach the board unchecked.
//!
//! [`GameService`] is the seam the session talks to. [`JsonService`] speaks
//! the JSON envelope of the hosted service over any [`Transport`];
//! [`crate::offline::OfflineService`] answers locally.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::board::{Board, Stone};
use crate::session::CallKind;

/// Errors from a remote exchange. Local state is never modified when one of
/// these is returned.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("another remote call is already in flight")]
    Busy,
    #[error("no remote game has been created for this session")]
    NoGame,
    #[error("the service could not find a move")]
    AiDeclined,
    #[error("board payload has {got} cells, expected {expected}")]
    BoardLength { expected: usize, got: usize },
    #[error("influence payload has {got} cells, expected {expected}")]
    InfluenceLength { expected: usize, got: usize },
    #[error("invalid current player in payload: {0}")]
    InvalidPlayer(Value),
    #[error("a {0:?} call was finished but none is pending")]
    NotPending(CallKind),
    #[error("a {call:?} call was finished as {handler:?}")]
    WrongHandler { call: CallKind, handler: CallKind },
    #[error("service error: {0}")]
    Service(String),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    pub name: String,
    pub ai_first: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameResponse {
    pub board: Vec<Value>,
    pub current_player: Value,
    pub game_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMoveRequest {
    pub board: Vec<u8>,
    pub game_id: String,
    pub current_player: u8,
    pub ai_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMoveResponse {
    /// Missing means the service did not move.
    #[serde(rename = "aiSuccess", default)]
    pub success: bool,
    #[serde(default)]
    pub board: Vec<Value>,
    #[serde(default)]
    pub current_player: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfluenceRequest {
    pub board: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InfluenceResponse {
    /// Echo of the analyzed board; advisory only.
    #[serde(default)]
    pub board: Vec<Value>,
    pub influence: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndGameRequest {
    pub board: Vec<u8>,
    pub game_id: String,
}

// =============================================================================
// Service seam
// =============================================================================

/// A provider of opponent moves and influence analysis.
pub trait GameService {
    fn create_game(&mut self, req: &CreateGameRequest) -> Result<CreateGameResponse, RemoteError>;

    fn ai_move(&mut self, req: &AiMoveRequest) -> Result<AiMoveResponse, RemoteError>;

    fn analyze_influence(
        &mut self,
        req: &InfluenceRequest,
    ) -> Result<InfluenceResponse, RemoteError>;

    /// Report a finished game. Services that keep no record may ignore it.
    fn end_game(&mut self, _req: &EndGameRequest) -> Result<(), RemoteError> {
        Ok(())
    }
}

/// Carries one JSON request body to `path` and returns the response body.
pub trait Transport {
    fn post(&mut self, path: &str, body: &str) -> anyhow::Result<String>;
}

impl<F> Transport for F
where
    F: FnMut(&str, &str) -> anyhow::Result<String>,
{
    fn post(&mut self, path: &str, body: &str) -> anyhow::Result<String> {
        self(path, body)
    }
}

pub const CREATE_GAME_PATH: &str = "/create-new-game";
pub const AI_MOVE_PATH: &str = "/ai-thinking";
pub const ANALYZE_PATH: &str = "/game-analyst";
pub const END_GAME_PATH: &str = "/end-game";

/// [`GameService`] over the hosted service's JSON envelope.
///
/// Every response is `{"success": bool, "data": ...}`. A false `success`
/// carries `error` or `message`; a missing `data` means the payload sits at
/// the top level.
pub struct JsonService<T> {
    transport: T,
}

impl<T: Transport> JsonService<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    fn call<Req, Resp>(&mut self, path: &str, req: &Req) -> Result<Resp, RemoteError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_string(req)?;
        debug!(path, bytes = body.len(), "remote request");
        let raw = self.transport.post(path, &body)?;
        let payload = unwrap_envelope(serde_json::from_str(&raw)?)?;
        Ok(serde_json::from_value(payload)?)
    }
}

fn unwrap_envelope(mut envelope: Value) -> Result<Value, RemoteError> {
    if envelope.get("success").and_then(Value::as_bool) != Some(true) {
        let message = ["error", "message"]
            .iter()
            .find_map(|key| envelope.get(*key).and_then(Value::as_str))
            .unwrap_or("API Error");
        return Err(RemoteError::Service(message.to_string()));
    }
    match envelope.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => Ok(data),
        _ => Ok(envelope),
    }
}

impl<T: Transport> GameService for JsonService<T> {
    fn create_game(&mut self, req: &CreateGameRequest) -> Result<CreateGameResponse, RemoteError> {
        self.call(CREATE_GAME_PATH, req)
    }

    fn ai_move(&mut self, req: &AiMoveRequest) -> Result<AiMoveResponse, RemoteError> {
        self.call(AI_MOVE_PATH, req)
    }

    fn analyze_influence(
        &mut self,
        req: &InfluenceRequest,
    ) -> Result<InfluenceResponse, RemoteError> {
        self.call(ANALYZE_PATH, req)
    }

    fn end_game(&mut self, req: &EndGameRequest) -> Result<(), RemoteError> {
        let _: Value = self.call(END_GAME_PATH, req)?;
        Ok(())
    }
}

// =============================================================================
// Sanitization
// =============================================================================

/// Per-point influence values from the analysis service. Advisory only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InfluenceBoard {
    size: usize,
    values: Vec<i32>,
}

impl InfluenceBoard {
    pub fn new(size: usize, values: Vec<i32>) -> Self {
        assert_eq!(values.len(), size * size, "influence length does not match board size");
        Self { size, values }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn at(&self, x: usize, y: usize) -> i32 {
        self.values[y * self.size + x]
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    }
}

/// Turn a wire board into a [`Board`] of `size`.
///
/// Cells outside `{0, 1, 2}` become empty. A payload of the wrong length is
/// rejected outright.
pub fn sanitize_board(values: &[Value], size: usize) -> Result<Board, RemoteError> {
    let expected = size * size;
    if values.len() != expected {
        return Err(RemoteError::BoardLength {
            expected,
            got: values.len(),
        });
    }

    let mut coerced = 0;
    let cells: Vec<Stone> = values
        .iter()
        .map(|v| {
            integer(v).and_then(Stone::from_wire).unwrap_or_else(|| {
                coerced += 1;
                Stone::Empty
            })
        })
        .collect();
    if coerced > 0 {
        warn!(coerced, "coerced malformed board cells to empty");
    }
    Ok(Board::from_cells(size, cells))
}

/// Turn a wire influence array into an [`InfluenceBoard`] of `size`.
///
/// Values that are not integers within `i32` become 0.
pub fn sanitize_influence(values: &[Value], size: usize) -> Result<InfluenceBoard, RemoteError> {
    let expected = size * size;
    if values.len() != expected {
        return Err(RemoteError::InfluenceLength {
            expected,
            got: values.len(),
        });
    }

    let mut coerced = 0;
    let cells: Vec<i32> = values
        .iter()
        .map(|v| {
            integer(v)
                .and_then(|i| i32::try_from(i).ok())
                .unwrap_or_else(|| {
                    coerced += 1;
                    0
                })
        })
        .collect();
    if coerced > 0 {
        warn!(coerced, "coerced malformed influence values to zero");
    }
    Ok(InfluenceBoard::new(size, cells))
}

/// The side to move must be Black or White.
pub fn sanitize_player(value: &Value) -> Result<Stone, RemoteError> {
    match integer(value).and_then(Stone::from_wire) {
        Some(stone) if !stone.is_empty() => Ok(stone),
        _ => Err(RemoteError::InvalidPlayer(value.clone())),
    }
}
