// src/handlers/scanner.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{CapScan, RequireCapability},
    },
    models::scan::{CameraResultPayload, DecodePayload, ScanConfirmation},
};

// As respostas trazem o estado da sessão: {"state": "scanning", ...}

#[utoipa::path(
    get,
    path = "/api/scanner",
    tag = "Scanner",
    responses((status = 200, description = "Estado atual da sessão de leitura")),
    security(("api_jwt" = []))
)]
pub async fn get_state(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CapScan>,
) -> impl IntoResponse {
    Json(app_state.scanner_service.state(&user.id).await)
}

#[utoipa::path(
    post,
    path = "/api/scanner/start",
    tag = "Scanner",
    responses(
        (status = 200, description = "Aguardando a permissão da câmera"),
        (status = 409, description = "Sessão em outro estado")
    ),
    security(("api_jwt" = []))
)]
pub async fn start(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CapScan>,
) -> Result<impl IntoResponse, ApiError> {
    let state = app_state
        .scanner_service
        .start(&user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(state)))
}

#[utoipa::path(
    post,
    path = "/api/scanner/camera",
    tag = "Scanner",
    request_body = CameraResultPayload,
    responses(
        (status = 200, description = "scanning, ou error com a mensagem da câmera"),
        (status = 409, description = "Sessão em outro estado")
    ),
    security(("api_jwt" = []))
)]
pub async fn camera(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CapScan>,
    Json(payload): Json<CameraResultPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let state = app_state
        .scanner_service
        .camera_result(&user.id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(state)))
}

#[utoipa::path(
    post,
    path = "/api/scanner/decode",
    tag = "Scanner",
    request_body = DecodePayload,
    responses(
        (status = 200, description = "result_found com a permissão, ou o estado inalterado"),
        (status = 422, description = "Invalid QR Code / Permission Not Approved / Scan Error")
    ),
    security(("api_jwt" = []))
)]
pub async fn decode(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CapScan>,
    Json(payload): Json<DecodePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let state = app_state
        .scanner_service
        .decode(&user.id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(state)))
}

#[utoipa::path(
    post,
    path = "/api/scanner/confirm",
    tag = "Scanner",
    responses(
        (status = 200, description = "Check-in ou check-out registrado", body = ScanConfirmation),
        (status = 409, description = "Nenhum resultado na tela ou passe já usado")
    ),
    security(("api_jwt" = []))
)]
pub async fn confirm(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CapScan>,
) -> Result<impl IntoResponse, ApiError> {
    let confirmation = app_state
        .scanner_service
        .confirm(&user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(confirmation)))
}

#[utoipa::path(
    post,
    path = "/api/scanner/cancel",
    tag = "Scanner",
    responses((status = 200, description = "Sessão de volta a idle")),
    security(("api_jwt" = []))
)]
pub async fn cancel(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CapScan>,
) -> impl IntoResponse {
    Json(app_state.scanner_service.cancel(&user.id).await)
}

#[utoipa::path(
    post,
    path = "/api/scanner/retry",
    tag = "Scanner",
    responses(
        (status = 200, description = "Nova tentativa de abrir a câmera"),
        (status = 409, description = "Sessão não está em erro")
    ),
    security(("api_jwt" = []))
)]
pub async fn retry(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CapScan>,
) -> Result<impl IntoResponse, ApiError> {
    let state = app_state
        .scanner_service
        .retry(&user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(state)))
}
