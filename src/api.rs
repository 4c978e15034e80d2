use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::change_detector::CycleDriver;
use crate::chat::{GuildId, UserId};
use crate::commands::{self, CommandReply, CHECK_COMMAND, JOIN_COMMAND};

#[derive(Clone)]
pub struct AppState {
    driver: Arc<CycleDriver>,
    api_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(driver: Arc<CycleDriver>, api_token: Option<String>) -> Self {
        Self {
            driver,
            api_token: api_token.map(Arc::from),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(&format!("/commands/{JOIN_COMMAND}"), post(join_free_games))
        .route(&format!("/commands/{CHECK_COMMAND}"), post(check_free_games))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct JoinReq {
    guild_id: GuildId,
    user_id: UserId,
}

type Rejection = (StatusCode, &'static str);

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), Rejection> {
    let Some(expected) = state.api_token.as_deref() else {
        return Ok(());
    };
    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if presented == Some(expected) {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "missing or invalid bearer token"))
    }
}

async fn join_free_games(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<JoinReq>,
) -> Result<Json<CommandReply>, Rejection> {
    authorize(&state, &headers)?;
    let platform = state.driver.platform();
    let reply = commands::join_free_games(
        platform.as_ref(),
        body.guild_id,
        body.user_id,
        &state.driver.target().role_name,
    )
    .await;
    Ok(Json(reply))
}

async fn check_free_games(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CommandReply>, Rejection> {
    authorize(&state, &headers)?;
    Ok(Json(commands::check_free_games(Arc::clone(&state.driver))))
}
