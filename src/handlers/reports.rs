// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{CapReadOwnPermissions, CapReadReports, RequireCapability},
    },
    models::report::{DashboardStats, PermissionReport, ReportQuery, UserStats},
};

// GET /api/reports/dashboard
#[utoipa::path(
    get,
    path = "/api/reports/dashboard",
    tag = "Reports",
    responses(
        (status = 200, description = "Cards do painel do admin", body = DashboardStats),
        (status = 403, description = "Somente admin")
    ),
    security(("api_jwt" = []))
)]
pub async fn dashboard(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapReadReports>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .report_service
        .dashboard_stats()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stats)))
}

#[utoipa::path(
    get,
    path = "/api/reports/me",
    tag = "Reports",
    responses((status = 200, description = "Cards do painel do funcionário", body = UserStats)),
    security(("api_jwt" = []))
)]
pub async fn my_stats(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequireCapability<CapReadOwnPermissions>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .report_service
        .user_stats(&user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(stats)))
}

#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "Reports",
    params(
        ("search" = Option<String>, Query, description = "Nome do funcionário, id, tipo ou motivo"),
        ("range" = Option<String>, Query, description = "all | week | month | year")
    ),
    responses((status = 200, description = "Relatório filtrado", body = PermissionReport)),
    security(("api_jwt" = []))
)]
pub async fn report(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapReadReports>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .report(&query, Utc::now())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/reports/export.pdf",
    tag = "Reports",
    params(
        ("search" = Option<String>, Query, description = "Nome do funcionário, id, tipo ou motivo"),
        ("range" = Option<String>, Query, description = "all | week | month | year")
    ),
    responses(
        (status = 200, description = "Relatório em PDF"),
        (status = 500, description = "Fontes do relatório ausentes")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireCapability<CapReadReports>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let now = Utc::now();
    let report = app_state
        .report_service
        .report(&query, now)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pdf_bytes = app_state
        .document_service
        .report_pdf(&report, now)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"permission-report-{}.pdf\"", now.format("%Y-%m-%d")),
        ),
    ];

    Ok((headers, pdf_bytes).into_response())
}
