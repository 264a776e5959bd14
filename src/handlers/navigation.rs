// src/handlers/navigation.rs

use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    config::AppState,
    middleware::auth::MaybeUser,
    models::access::{GateDecision, ResolveQuery},
    services::navigation,
};

// GET /api/navigation/resolve?path=/admin/users
#[utoipa::path(
    get,
    path = "/api/navigation/resolve",
    tag = "Navigation",
    params(("path" = String, Query, description = "Rota do front end")),
    responses(
        (status = 200, description = "render, redirect ou not_found para o usuário atual")
    )
)]
pub async fn resolve(
    MaybeUser(user): MaybeUser,
    Query(query): Query<ResolveQuery>,
) -> Json<GateDecision> {
    let role = user.as_ref().map(|u| u.role);
    let decision = navigation::resolve(&query.path, role);
    tracing::debug!("🧭 {} ({:?}) -> {:?}", query.path, role, decision);
    Json(decision)
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Serviço no ar"))
)]
pub async fn health(State(app_state): State<AppState>) -> Json<Value> {
    let storage = if app_state.db_pool.is_some() { "postgres" } else { "memory" };
    Json(json!({ "status": "ok", "storage": storage }))
}
