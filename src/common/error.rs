// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::{
    common::i18n::I18nStore,
    middleware::i18n::Locale,
    models::{
        access::Capability,
        permission::{PermissionAction, PermissionStatus},
    },
};

// Erros de domínio. Cada variante tem uma chave de tradução (ver locales/*.json).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Sem a capacidade '{0}'")]
    Forbidden(Capability),

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Departamento não encontrado")]
    DepartmentNotFound,

    #[error("Permissão não encontrada")]
    PermissionNotFound,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Administrador não pode remover a si mesmo")]
    CannotDeleteSelf,

    #[error("Transição inválida: {action:?} a partir de {from:?}")]
    InvalidTransition {
        action: PermissionAction,
        from: PermissionStatus,
    },

    #[error("Check-in já registrado")]
    AlreadyCheckedIn,

    #[error("Check-in ainda não registrado")]
    NotCheckedIn,

    #[error("Check-out já registrado")]
    AlreadyCheckedOut,

    #[error("QR Code inválido")]
    InvalidQrCode,

    #[error("Permissão não aprovada")]
    PermissionNotApproved,

    #[error("Erro de leitura: {0}")]
    ScanFailed(String),

    #[error("Evento de scanner inválido no estado '{0}'")]
    ScannerInvalidState(&'static str),

    #[error("QR Code indisponível para esta permissão")]
    QrUnavailable,

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Erro de validação com uma única mensagem num campo.
    pub fn field(field: &'static str, code: &'static str, message_key: &'static str) -> Self {
        let mut error = validator::ValidationError::new(code);
        error.message = Some(message_key.into());
        let mut errors = validator::ValidationErrors::new();
        errors.add(field, error);
        AppError::ValidationError(errors)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::DepartmentNotFound | AppError::PermissionNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::EmailAlreadyExists
            | AppError::CannotDeleteSelf
            | AppError::InvalidTransition { .. }
            | AppError::AlreadyCheckedIn
            | AppError::NotCheckedIn
            | AppError::AlreadyCheckedOut
            | AppError::ScannerInvalidState(_)
            | AppError::QrUnavailable => StatusCode::CONFLICT,
            AppError::InvalidQrCode | AppError::PermissionNotApproved | AppError::ScanFailed(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Chave do catálogo de mensagens
    fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation.failed",
            AppError::InvalidCredentials => "auth.invalid_credentials",
            AppError::InvalidToken => "auth.invalid_token",
            AppError::Forbidden(_) => "auth.forbidden",
            AppError::UserNotFound => "users.not_found",
            AppError::DepartmentNotFound => "departments.not_found",
            AppError::PermissionNotFound => "permissions.not_found",
            AppError::EmailAlreadyExists => "users.email_taken",
            AppError::CannotDeleteSelf => "users.cannot_delete_self",
            AppError::InvalidTransition { .. } => "permissions.invalid_transition",
            AppError::AlreadyCheckedIn => "permissions.already_checked_in",
            AppError::NotCheckedIn => "permissions.not_checked_in",
            AppError::AlreadyCheckedOut => "permissions.already_checked_out",
            AppError::InvalidQrCode => "scan.invalid_qr",
            AppError::PermissionNotApproved => "scan.not_approved",
            AppError::ScanFailed(_) => "scan.failed",
            AppError::ScannerInvalidState(_) => "scan.invalid_state",
            AppError::QrUnavailable => "permissions.qr_unavailable",
            _ => "server.internal",
        }
    }

    /// Converte o erro de domínio na resposta HTTP, traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        let lang = locale.0.as_str();

        let error = match self {
            AppError::Forbidden(capability) => {
                store.translate_with(lang, self.message_key(), &[("capability", capability.slug())])
            }
            AppError::InvalidTransition { action, from } => store.translate_with(
                lang,
                self.message_key(),
                &[("action", action.as_str()), ("status", from.as_str())],
            ),
            AppError::ScanFailed(detail) => {
                store.translate_with(lang, self.message_key(), &[("detail", detail.as_str())])
            }
            AppError::ScannerInvalidState(state) => {
                store.translate_with(lang, self.message_key(), &[("state", *state)])
            }
            _ => store.translate(lang, self.message_key()),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| match &e.message {
                            Some(key) => store.translate(lang, key),
                            None => e.code.to_string(),
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            _ => None,
        };

        ApiError { status, error, details }
    }
}

// A resposta de erro que sai para o cliente
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> I18nStore {
        I18nStore::load().expect("catálogos embutidos")
    }

    #[test]
    fn forbidden_message_names_the_capability() {
        let err = AppError::Forbidden(Capability::ReportsRead);
        assert_eq!(err.to_string(), "Sem a capacidade 'reports:read'");
    }

    #[test]
    fn validation_error_lists_translated_field_messages() {
        let err = AppError::field("endTime", "time_window", "validation.end_after_start");
        let api = err.to_api_error(&Locale("en".into()), &store());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        let details = api.details.expect("details");
        assert_eq!(
            details["endTime"][0],
            "End time must be after the start time"
        );
    }

    #[test]
    fn scan_lookup_errors_use_fixed_titles() {
        let api = AppError::InvalidQrCode.to_api_error(&Locale("en".into()), &store());
        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.error, "Invalid QR Code");

        let api = AppError::PermissionNotApproved.to_api_error(&Locale("en".into()), &store());
        assert_eq!(api.error, "Permission Not Approved");
    }

    #[test]
    fn invalid_transition_names_action_and_status() {
        let err = AppError::InvalidTransition {
            action: PermissionAction::Approve,
            from: PermissionStatus::Rejected,
        };
        let api = err.to_api_error(&Locale("en".into()), &store());
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert!(api.error.contains("approve"));
        assert!(api.error.contains("rejected"));
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("segredo"));
        let api = err.to_api_error(&Locale("id".into()), &store());
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("segredo"));
    }
}
