// src/handlers/permissions.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{
            CapCreatePermission, CapDecidePermissions, CapReadAllPermissions, CapReadOwnPermissions,
            CapScan, RequireCapability,
        },
    },
    models::permission::{
        CreatePermissionPayload, Permission, PermissionListQuery, PermissionWithUser, RecentQuery,
    },
};

// POST /api/permissions
#[utoipa::path(
    post,
    path = "/api/permissions",
    tag = "Permissions",
    request_body = CreatePermissionPayload,
    responses(
        (status = 201, description = "Solicitação criada como pendente", body = Permission),
        (status = 400, description = "Dados inválidos (ex.: endTime antes de startTime)"),
        (status = 403, description = "Somente funcionários")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_permission(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CapCreatePermission>,
    Json(payload): Json<CreatePermissionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let permission = app_state
        .permission_service
        .create(&user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(permission)))
}

#[utoipa::path(
    get,
    path = "/api/permissions/mine",
    tag = "Permissions",
    responses((status = 200, description = "Permissões do usuário logado", body = Vec<Permission>)),
    security(("api_jwt" = []))
)]
pub async fn list_my_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CapReadOwnPermissions>,
) -> Result<impl IntoResponse, ApiError> {
    let permissions = app_state
        .permission_service
        .list_for_user(&user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(permissions)))
}

#[utoipa::path(
    get,
    path = "/api/permissions",
    tag = "Permissions",
    params(
        ("search" = Option<String>, Query, description = "Nome do funcionário, id, tipo ou status"),
        ("status" = Option<String>, Query, description = "pending | approved | rejected | completed")
    ),
    responses((status = 200, description = "OK", body = Vec<PermissionWithUser>)),
    security(("api_jwt" = []))
)]
pub async fn list_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapReadAllPermissions>,
    Query(query): Query<PermissionListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let permissions = app_state
        .permission_service
        .list(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(permissions)))
}

#[utoipa::path(
    get,
    path = "/api/permissions/recent",
    tag = "Permissions",
    params(("count" = Option<usize>, Query, description = "Quantidade (padrão 5)")),
    responses((status = 200, description = "OK", body = Vec<PermissionWithUser>)),
    security(("api_jwt" = []))
)]
pub async fn recent_permissions(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapReadAllPermissions>,
    Query(query): Query<RecentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let permissions = app_state
        .permission_service
        .recent(query.count)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(permissions)))
}

#[utoipa::path(
    get,
    path = "/api/permissions/{id}",
    tag = "Permissions",
    params(("id" = String, Path, description = "ID da permissão")),
    responses(
        (status = 200, description = "OK", body = PermissionWithUser),
        (status = 404, description = "Permissão não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_permission(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let permission = app_state
        .permission_service
        .get_for(&id, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(permission)))
}

// --- TRANSIÇÕES ---

#[utoipa::path(
    post,
    path = "/api/permissions/{id}/approve",
    tag = "Permissions",
    params(("id" = String, Path, description = "ID da permissão")),
    responses(
        (status = 200, description = "Aprovada, com qrCode", body = Permission),
        (status = 409, description = "A permissão não está pendente")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_permission(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CapDecidePermissions>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let permission = app_state
        .permission_service
        .approve(&id, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(permission)))
}

#[utoipa::path(
    post,
    path = "/api/permissions/{id}/reject",
    tag = "Permissions",
    params(("id" = String, Path, description = "ID da permissão")),
    responses(
        (status = 200, description = "OK", body = Permission),
        (status = 409, description = "A permissão não está pendente")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_permission(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CapDecidePermissions>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let permission = app_state
        .permission_service
        .reject(&id, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(permission)))
}

#[utoipa::path(
    post,
    path = "/api/permissions/{id}/check-in",
    tag = "Permissions",
    params(("id" = String, Path, description = "ID da permissão")),
    responses(
        (status = 200, description = "OK", body = Permission),
        (status = 409, description = "Não aprovada ou saída já registrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn check_in_permission(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CapScan>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let permission = app_state
        .permission_service
        .check_in(&id, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(permission)))
}

#[utoipa::path(
    post,
    path = "/api/permissions/{id}/check-out",
    tag = "Permissions",
    params(("id" = String, Path, description = "ID da permissão")),
    responses(
        (status = 200, description = "Concluída", body = Permission),
        (status = 409, description = "Sem check-in ou já concluída")
    ),
    security(("api_jwt" = []))
)]
pub async fn check_out_permission(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CapScan>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let permission = app_state
        .permission_service
        .check_out(&id, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(permission)))
}

// --- QR E PASSE ---

#[utoipa::path(
    get,
    path = "/api/permissions/{id}/qr.png",
    tag = "Permissions",
    params(("id" = String, Path, description = "ID da permissão")),
    responses(
        (status = 200, description = "QR code (PNG) com o id da permissão"),
        (status = 409, description = "Permissão ainda sem QR")
    ),
    security(("api_jwt" = []))
)]
pub async fn permission_qr(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let png = app_state
        .permission_service
        .qr_png(&id, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

#[utoipa::path(
    get,
    path = "/api/permissions/{id}/pass.pdf",
    tag = "Permissions",
    params(("id" = String, Path, description = "ID da permissão")),
    responses(
        (status = 200, description = "Passe para impressão"),
        (status = 409, description = "Permissão ainda sem QR")
    ),
    security(("api_jwt" = []))
)]
pub async fn permission_pass(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let found = app_state
        .permission_service
        .get_for(&id, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .document_service
        .permission_pass_pdf(&found.permission, found.user.as_ref())
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Configura os Headers para o navegador baixar ou mostrar o PDF
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("inline; filename=\"{}.pdf\"", id)),
    ];

    Ok((headers, pdf_bytes).into_response())
}
