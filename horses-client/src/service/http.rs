//! HTTP game service.
//!
//! Speaks the JSON API of the Smart Horses backend with `reqwest`.

use super::{GameService, ServiceError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use smart_horses_types::{
    BoardState, Coord, Difficulty, ErrorBody, HealthStatus, LegalMoves, LegalMovesReply,
    LegalMovesRequest, MachineMove, MachineMoveRequest, MoveOutcome, MoveReply, MoveRequest,
    NewGameRequest, Side,
};
use std::time::Duration;
use tracing::{debug, warn};

/// Public deployment of the game authority.
pub const DEFAULT_SERVER_URL: &str = "https://smart-horses-backend.onrender.com";

const CREATE_GAME_FAILED: &str = "Failed to create new game";
const MOVE_FAILED: &str = "Invalid move";
const LEGAL_MOVES_FAILED: &str = "Failed to get valid moves";
const MACHINE_MOVE_FAILED: &str = "Failed to get machine move";
const HEALTH_FAILED: &str = "Health check failed";

/// Game service backed by the HTTP API.
#[derive(Debug, Clone)]
pub struct HttpGameService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGameService {
    /// Create a service for the server at `base_url`.
    ///
    /// Every request gives up after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ServiceError::InvalidConfig(format!(
                "server url must start with http:// or https://, got {base_url:?}"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InvalidConfig(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// Server base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B, R>(&self, path: &str, body: &B, failure: &str) -> Result<R, ServiceError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "request failed");
                ServiceError::from(e)
            })?;
        decode(response, failure).await
    }
}

/// Turn a response into `R`, or into the server's failure message.
async fn decode<R: DeserializeOwned>(
    response: reqwest::Response,
    failure: &str,
) -> Result<R, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        let message = body.message.unwrap_or_else(|| failure.to_string());
        warn!(%status, %message, "game server refused request");
        return Err(ServiceError::Rejected(message));
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        warn!(error = %e, "malformed reply from game server");
        ServiceError::Malformed(e.to_string())
    })
}

#[async_trait]
impl GameService for HttpGameService {
    async fn create_game(&self, difficulty: Difficulty) -> Result<BoardState, ServiceError> {
        self.post(
            "/api/game/new",
            &NewGameRequest { difficulty },
            CREATE_GAME_FAILED,
        )
        .await
    }

    async fn submit_move(
        &self,
        before: &BoardState,
        destination: Coord,
    ) -> Result<MoveOutcome, ServiceError> {
        let request = MoveRequest {
            game_state: before.clone(),
            destination,
        };
        let reply: MoveReply = self.post("/api/game/move", &request, MOVE_FAILED).await?;
        Ok(reply.into())
    }

    async fn fetch_legal_moves(
        &self,
        board: &BoardState,
        side: Side,
    ) -> Result<LegalMoves, ServiceError> {
        let request = LegalMovesRequest {
            game_state: board.clone(),
            knight: side,
        };
        let reply: LegalMovesReply = self
            .post("/api/game/valid-moves", &request, LEGAL_MOVES_FAILED)
            .await?;
        Ok(reply.into_legal_moves()?)
    }

    async fn fetch_opponent_move(&self, board: &BoardState) -> Result<MachineMove, ServiceError> {
        let request = MachineMoveRequest {
            game_state: board.clone(),
        };
        self.post("/api/game/machine-move", &request, MACHINE_MOVE_FAILED)
            .await
    }

    async fn health(&self) -> Result<HealthStatus, ServiceError> {
        let url = self.url("/health");
        debug!(%url, "GET");
        let response = self.client.get(&url).send().await?;
        decode(response, HEALTH_FAILED).await
    }
}
