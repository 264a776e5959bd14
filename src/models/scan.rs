// src/models/scan.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    models::{auth::User, permission::Permission},
};

// Exceção do decodificador quando o quadro não tem QR. Não é erro de verdade.
const FRAME_MISS: &str = "NotFoundException";

/// Próxima ação da portaria para a permissão lida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScanAction {
    CheckIn,
    CheckOut,
    // Entrada e saída já registradas
    Done,
}

impl ScanAction {
    pub fn for_permission(permission: &Permission) -> Self {
        match (permission.check_in_time, permission.check_out_time) {
            (Some(_), None) => ScanAction::CheckOut,
            (Some(_), Some(_)) => ScanAction::Done,
            _ => ScanAction::CheckIn,
        }
    }

    pub fn is_check_in(self) -> bool {
        self == ScanAction::CheckIn
    }
}

/// Falhas de câmera, com mensagens fixas para o usuário.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraFailure {
    Denied,
    NotFound,
    InUse,
    OverConstrained,
    Unsupported,
    Other(Option<String>),
}

impl CameraFailure {
    /// Mapeia o `name` do erro de mídia do navegador.
    pub fn from_error_name(name: &str, message: Option<String>) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" => CameraFailure::Denied,
            "NotFoundError" | "DevicesNotFoundError" => CameraFailure::NotFound,
            "NotReadableError" | "TrackStartError" => CameraFailure::InUse,
            "OverconstrainedError" => CameraFailure::OverConstrained,
            "NotSupportedError" => CameraFailure::Unsupported,
            _ => CameraFailure::Other(message),
        }
    }

    pub fn message(&self) -> String {
        match self {
            CameraFailure::Denied => {
                "Camera access was denied. Please allow camera access in your browser settings.".into()
            }
            CameraFailure::NotFound => "No camera was found on your device.".into(),
            CameraFailure::InUse => "The camera is already in use by another application.".into(),
            CameraFailure::OverConstrained => {
                "The requested camera does not meet the required constraints.".into()
            }
            CameraFailure::Unsupported => "Camera access is not supported by this browser.".into(),
            CameraFailure::Other(Some(message)) if !message.trim().is_empty() => message.clone(),
            CameraFailure::Other(_) => "An error occurred while accessing the camera.".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScanState {
    Idle,
    RequestingPermission,
    Scanning,
    #[serde(rename_all = "camelCase")]
    ResultFound {
        permission: Permission,
        owner: Option<User>,
        action: ScanAction,
        is_check_in: bool,
    },
    Error {
        message: String,
        retryable: bool,
    },
}

impl ScanState {
    pub fn name(&self) -> &'static str {
        match self {
            ScanState::Idle => "idle",
            ScanState::RequestingPermission => "requesting_permission",
            ScanState::Scanning => "scanning",
            ScanState::ResultFound { .. } => "result_found",
            ScanState::Error { .. } => "error",
        }
    }
}

/// Máquina de estados da leitura de QR de um segurança.
#[derive(Debug, Clone)]
pub struct ScanSession {
    state: ScanState,
}

impl Default for ScanSession {
    fn default() -> Self {
        Self { state: ScanState::Idle }
    }
}

impl ScanSession {
    pub fn state(&self) -> &ScanState {
        &self.state
    }

    fn invalid(&self) -> AppError {
        AppError::ScannerInvalidState(self.state.name())
    }

    pub fn start(&mut self) -> Result<(), AppError> {
        match self.state {
            ScanState::Idle | ScanState::Error { .. } => {
                self.state = ScanState::RequestingPermission;
                Ok(())
            }
            _ => Err(self.invalid()),
        }
    }

    pub fn camera_result(&mut self, result: Result<(), CameraFailure>) -> Result<(), AppError> {
        if !matches!(self.state, ScanState::RequestingPermission) {
            return Err(self.invalid());
        }

        self.state = match result {
            Ok(()) => ScanState::Scanning,
            Err(failure) => ScanState::Error {
                message: failure.message(),
                retryable: true,
            },
        };
        Ok(())
    }

    pub fn retry(&mut self) -> Result<(), AppError> {
        match self.state {
            ScanState::Error { .. } => {
                self.state = ScanState::RequestingPermission;
                Ok(())
            }
            _ => Err(self.invalid()),
        }
    }

    /// Resultado da busca do id lido. Erros de busca voltam para `Idle`.
    pub fn decoded(&mut self, found: Option<(Permission, Option<User>)>) -> Result<(), AppError> {
        match self.state {
            ScanState::Scanning => {}
            // Leituras repetidas do mesmo quadro enquanto o resultado está na tela
            ScanState::ResultFound { .. } => return Ok(()),
            _ => return Err(self.invalid()),
        }

        let Some((permission, owner)) = found else {
            self.state = ScanState::Idle;
            return Err(AppError::InvalidQrCode);
        };

        if !permission.status.is_scannable() {
            self.state = ScanState::Idle;
            return Err(AppError::PermissionNotApproved);
        }

        let action = ScanAction::for_permission(&permission);
        self.state = ScanState::ResultFound {
            permission,
            owner,
            action,
            is_check_in: action.is_check_in(),
        };
        Ok(())
    }

    pub fn decode_failed(&mut self, name: &str, message: Option<String>) -> Result<(), AppError> {
        if !matches!(self.state, ScanState::Scanning) {
            return Err(self.invalid());
        }
        if name == FRAME_MISS {
            return Ok(());
        }

        self.state = ScanState::Idle;
        Err(AppError::ScanFailed(
            message.unwrap_or_else(|| "An error occurred while scanning".into()),
        ))
    }

    /// Retira o resultado para confirmação; a sessão volta para `Idle`.
    pub fn take_result(&mut self) -> Result<(String, ScanAction), AppError> {
        match &self.state {
            ScanState::ResultFound { permission, action, .. } => {
                let taken = (permission.id.clone(), *action);
                self.state = ScanState::Idle;
                Ok(taken)
            }
            _ => Err(self.invalid()),
        }
    }

    pub fn cancel(&mut self) {
        self.state = ScanState::Idle;
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CameraResultPayload {
    pub granted: bool,
    /// `name` do DOMException (ex.: NotAllowedError)
    #[serde(default)]
    #[schema(example = "NotAllowedError")]
    pub error_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl CameraResultPayload {
    pub fn into_result(self) -> Result<(), CameraFailure> {
        if self.granted {
            return Ok(());
        }
        Err(match self.error_name {
            Some(name) => CameraFailure::from_error_name(&name, self.message),
            None => CameraFailure::Other(self.message),
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecodePayload {
    /// Texto decodificado (o id da permissão)
    #[serde(default)]
    #[schema(example = "permission-7")]
    pub text: Option<String>,
    #[serde(default)]
    #[schema(example = "NotFoundException")]
    pub error_name: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanConfirmation {
    pub action: ScanAction,
    pub permission: Permission,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::permission::{PermissionStatus, PermissionType};
    use chrono::{TimeZone, Utc};

    fn permission(status: PermissionStatus) -> Permission {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        Permission {
            id: "permission-7".into(),
            user_id: "user-2".into(),
            kind: PermissionType::Sick,
            reason: "Consulta médica".into(),
            start_time: t,
            end_time: t + chrono::Duration::hours(4),
            status,
            created_at: t,
            approved_at: None,
            approved_by: None,
            check_in_time: None,
            check_out_time: None,
            qr_code: None,
        }
    }

    fn scanning() -> ScanSession {
        let mut session = ScanSession::default();
        session.start().unwrap();
        session.camera_result(Ok(())).unwrap();
        session
    }

    #[test]
    fn camera_grant_moves_to_scanning() {
        let session = scanning();
        assert_eq!(session.state().name(), "scanning");
    }

    #[test]
    fn camera_failure_shows_fixed_message_and_allows_retry() {
        let mut session = ScanSession::default();
        session.start().unwrap();
        session
            .camera_result(Err(CameraFailure::from_error_name("NotReadableError", None)))
            .unwrap();

        match session.state() {
            ScanState::Error { message, retryable } => {
                assert_eq!(message, "The camera is already in use by another application.");
                assert!(*retryable);
            }
            other => panic!("estado inesperado {:?}", other),
        }

        session.retry().unwrap();
        assert_eq!(session.state().name(), "requesting_permission");
    }

    #[test]
    fn unknown_camera_error_uses_device_message_or_default() {
        let custom = CameraFailure::from_error_name("AbortError", Some("Hardware error".into()));
        assert_eq!(custom.message(), "Hardware error");
        let blank = CameraFailure::Other(None);
        assert_eq!(blank.message(), "An error occurred while accessing the camera.");
    }

    #[test]
    fn unknown_id_is_invalid_qr_and_returns_to_idle() {
        let mut session = scanning();
        assert!(matches!(session.decoded(None), Err(AppError::InvalidQrCode)));
        assert_eq!(session.state().name(), "idle");
    }

    #[test]
    fn pending_permission_is_not_actionable() {
        let mut session = scanning();
        let result = session.decoded(Some((permission(PermissionStatus::Pending), None)));
        assert!(matches!(result, Err(AppError::PermissionNotApproved)));
        assert_eq!(session.state().name(), "idle");
    }

    #[test]
    fn approved_without_check_in_means_check_in() {
        let mut session = scanning();
        session
            .decoded(Some((permission(PermissionStatus::Approved), None)))
            .unwrap();

        match session.state() {
            ScanState::ResultFound { action, is_check_in, .. } => {
                assert_eq!(*action, ScanAction::CheckIn);
                assert!(*is_check_in);
            }
            other => panic!("estado inesperado {:?}", other),
        }
    }

    #[test]
    fn checked_in_permission_means_check_out() {
        let mut p = permission(PermissionStatus::Approved);
        p.check_in_time = Some(p.start_time);
        assert_eq!(ScanAction::for_permission(&p), ScanAction::CheckOut);

        p.check_out_time = Some(p.end_time);
        assert_eq!(ScanAction::for_permission(&p), ScanAction::Done);
    }

    #[test]
    fn frame_misses_are_ignored_while_scanning() {
        let mut session = scanning();
        session.decode_failed(FRAME_MISS, None).unwrap();
        assert_eq!(session.state().name(), "scanning");

        let err = session
            .decode_failed("ChecksumException", Some("bad checksum".into()))
            .unwrap_err();
        assert!(matches!(err, AppError::ScanFailed(ref m) if m == "bad checksum"));
        assert_eq!(session.state().name(), "idle");
    }

    #[test]
    fn repeated_decodes_keep_the_first_result() {
        let mut session = scanning();
        session
            .decoded(Some((permission(PermissionStatus::Approved), None)))
            .unwrap();
        session.decoded(None).unwrap();
        assert_eq!(session.state().name(), "result_found");
    }

    #[test]
    fn take_result_resets_to_idle() {
        let mut session = scanning();
        session
            .decoded(Some((permission(PermissionStatus::Approved), None)))
            .unwrap();

        let (id, action) = session.take_result().unwrap();
        assert_eq!(id, "permission-7");
        assert_eq!(action, ScanAction::CheckIn);
        assert_eq!(session.state().name(), "idle");
        assert!(matches!(session.take_result(), Err(AppError::ScannerInvalidState("idle"))));
    }

    #[test]
    fn events_out_of_order_are_rejected() {
        let mut session = ScanSession::default();
        assert!(session.camera_result(Ok(())).is_err());
        assert!(session.decoded(None).is_err());
        assert!(session.retry().is_err());
        session.start().unwrap();
        assert!(session.start().is_err());
        session.cancel();
        assert_eq!(session.state().name(), "idle");
    }

    #[test]
    fn result_state_serializes_with_tag() {
        let mut session = scanning();
        session
            .decoded(Some((permission(PermissionStatus::Approved), None)))
            .unwrap();
        let json = serde_json::to_value(session.state()).unwrap();
        assert_eq!(json["state"], "result_found");
        assert_eq!(json["isCheckIn"], true);
        assert_eq!(json["action"], "check_in");
        assert_eq!(json["permission"]["id"], "permission-7");
    }
}
