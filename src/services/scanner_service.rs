// src/services/scanner_service.rs

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::{
    common::error::AppError,
    db::UserRepository,
    models::{
        auth::User,
        scan::{CameraResultPayload, DecodePayload, ScanAction, ScanConfirmation, ScanSession, ScanState},
    },
    services::permission_service::PermissionService,
};

// Uma sessão de leitura por segurança (chave: id do usuário)
#[derive(Clone)]
pub struct ScannerService {
    sessions: Arc<RwLock<HashMap<String, ScanSession>>>,
    permissions: PermissionService,
    users: Arc<dyn UserRepository>,
}

impl ScannerService {
    pub fn new(permissions: PermissionService, users: Arc<dyn UserRepository>) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            permissions,
            users,
        }
    }

    pub async fn state(&self, guard_id: &str) -> ScanState {
        self.sessions
            .read()
            .await
            .get(guard_id)
            .map(|s| s.state().clone())
            .unwrap_or(ScanState::Idle)
    }

    // Aplica `f` na sessão do segurança e devolve o estado resultante
    async fn with_session<F>(&self, guard_id: &str, f: F) -> Result<ScanState, AppError>
    where
        F: FnOnce(&mut ScanSession) -> Result<(), AppError>,
    {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(guard_id.to_string()).or_default();
        let from = session.state().name();
        f(session)?;
        tracing::debug!("📷 Scanner {}: {} -> {}", guard_id, from, session.state().name());
        Ok(session.state().clone())
    }

    pub async fn start(&self, guard_id: &str) -> Result<ScanState, AppError> {
        self.with_session(guard_id, |s| s.start()).await
    }

    pub async fn camera_result(&self, guard_id: &str, payload: CameraResultPayload) -> Result<ScanState, AppError> {
        let result = payload.into_result();
        if let Err(failure) = &result {
            tracing::warn!("📷 Câmera indisponível para {}: {:?}", guard_id, failure);
        }
        self.with_session(guard_id, |s| s.camera_result(result)).await
    }

    pub async fn retry(&self, guard_id: &str) -> Result<ScanState, AppError> {
        self.with_session(guard_id, |s| s.retry()).await
    }

    pub async fn cancel(&self, guard_id: &str) -> ScanState {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(guard_id.to_string()).or_default();
        session.cancel();
        session.state().clone()
    }

    /// Um quadro decodificado (ou a falha do decodificador).
    pub async fn decode(&self, guard_id: &str, payload: DecodePayload) -> Result<ScanState, AppError> {
        if let Some(name) = payload.error_name {
            let message = payload.error_message;
            return self.with_session(guard_id, |s| s.decode_failed(&name, message)).await;
        }

        let text = payload.text.as_deref().map(str::trim).unwrap_or_default();
        if text.is_empty() {
            // Quadro sem código
            return Ok(self.state(guard_id).await);
        }

        let found = match self.permissions.find(text).await? {
            Some(permission) => {
                let owner = self.users.find_by_id(&permission.user_id).await?;
                Some((permission, owner))
            }
            None => None,
        };

        if found.is_none() {
            tracing::warn!("📷 QR desconhecido lido por {}: {}", guard_id, text);
        }
        self.with_session(guard_id, |s| s.decoded(found)).await
    }

    /// Confirma o resultado na tela: check-in ou check-out.
    pub async fn confirm(&self, guard: &User) -> Result<ScanConfirmation, AppError> {
        let (permission_id, action) = {
            let mut sessions = self.sessions.write().await;
            let session = sessions.entry(guard.id.clone()).or_default();
            session.take_result()?
        };

        let permission = match action {
            ScanAction::CheckIn => self.permissions.check_in(&permission_id, guard).await?,
            ScanAction::CheckOut => self.permissions.check_out(&permission_id, guard).await?,
            ScanAction::Done => return Err(AppError::AlreadyCheckedOut),
        };

        Ok(ScanConfirmation { action, permission })
    }
}
