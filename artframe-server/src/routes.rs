use artframe_core::rpc::dispatch;
use artframe_model::RpcResponse;
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::state::AppState;

pub const RPC: &str = "/rpc";
pub const PING: &str = "/ping";

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(RPC, post(rpc))
        .route(PING, get(ping))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// One message in, one envelope out. Always HTTP 200, including for bodies
/// that are not JSON at all.
async fn rpc(State(state): State<AppState>, body: Bytes) -> Json<RpcResponse> {
    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(err) => {
            warn!("rpc body is not JSON: {}", err);
            return Json(RpcResponse::failure(format!(
                "Malformed request: {err}"
            )));
        }
    };

    Json(dispatch(&state.service, message).await)
}

async fn ping(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}
