use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;

use crate::gateway::{AccountsReply, ProxyError, QueryParams};
use crate::server::AppState;

pub const SERVICE_NAME: &str = "nibo-bff";

#[derive(Serialize)]
pub struct HealthResponse {
    ok: bool,
    service: &'static str,
    time: String,
}

pub async fn health() -> impl IntoResponse {
    let body = HealthResponse {
        ok: true,
        service: SERVICE_NAME,
        time: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
    };
    (StatusCode::OK, Json(body))
}

/// Lists Nibo accounts. The query string, OData options included, is
/// forwarded untouched.
pub async fn list_accounts(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<AccountsReply>, ProxyError> {
    let reply = state.proxy.handle(QueryParams::from_pairs(params)).await?;
    Ok(Json(reply))
}
