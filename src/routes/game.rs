use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::extractors::{JsonBody, Player};
use crate::game::high_scores::{self, HighScores};
use crate::game::registry::SharedSession;
use crate::game::session::{GuessOutcome, SessionView};
use crate::game::types::Guess;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/game", get(current_game))
        .route("/game/guess", post(submit_guess))
        .route("/game/play-again", post(play_again))
        .route("/high-scores", get(get_high_scores))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessRequest {
    pub direction: Guess,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GuessResponse {
    outcome: GuessOutcome,
    session: SessionView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlayAgainResponse {
    reset: bool,
    session: SessionView,
}

async fn existing_session(state: &AppState, player: &Player) -> Result<SharedSession, AppError> {
    state
        .registry()
        .get(player.id())
        .await
        .ok_or_else(|| AppError::not_found("没有进行中的游戏，请先获取 /api/game"))
}

async fn current_game(State(state): State<AppState>, player: Player) -> impl IntoResponse {
    let session = state.registry().get_or_start(player.id()).await;
    let view = session.lock().await.view();
    ok(view)
}

async fn submit_guess(
    State(state): State<AppState>,
    player: Player,
    JsonBody(req): JsonBody<GuessRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = existing_session(&state, &player).await?;
    let mut guard = session.lock().await;
    let outcome = guard.guess(req.direction).await?;
    Ok(ok(GuessResponse {
        outcome,
        session: guard.view(),
    }))
}

async fn play_again(
    State(state): State<AppState>,
    player: Player,
) -> Result<impl IntoResponse, AppError> {
    let session = existing_session(&state, &player).await?;
    let mut guard = session.lock().await;
    let reset = guard.reset().await?;
    Ok(ok(PlayAgainResponse {
        reset,
        session: guard.view(),
    }))
}

async fn get_high_scores(State(state): State<AppState>, player: Player) -> impl IntoResponse {
    let mut scores: HighScores = high_scores::load(state.store(), player.id()).await;
    if let Some(session) = state.registry().get(player.id()).await {
        let live = session.lock().await.high_scores();
        scores.personal = scores.personal.max(live.personal);
        scores.global = scores.global.max(live.global);
    }
    ok(scores)
}
