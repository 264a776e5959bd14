// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::access::Capability,
};

/// 1. O Trait que define uma capacidade exigida pela rota
pub trait CapabilityDef: Send + Sync + 'static {
    fn capability() -> Capability;
}

/// 2. O Extractor (Guardião)
pub struct RequireCapability<T>(pub PhantomData<T>);

// 3. Verificação contra a tabela de capacidades do perfil
impl<T, S> FromRequestParts<S> for RequireCapability<T>
where
    T: CapabilityDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let Ok(locale) = Locale::from_request_parts(parts, state).await;

        let required = T::capability();
        let error = match parts.extensions.get::<AuthenticatedUser>() {
            None => AppError::InvalidToken,
            Some(AuthenticatedUser(user)) if user.role.can(required) => {
                return Ok(RequireCapability(PhantomData));
            }
            Some(AuthenticatedUser(user)) => {
                tracing::warn!(
                    "🚫 {} ({}) sem a capacidade '{}'",
                    user.id,
                    user.role.as_str(),
                    required.slug()
                );
                AppError::Forbidden(required)
            }
        };

        Err(error.to_api_error(&locale, &app_state.i18n_store))
    }
}

// ---
// DEFINIÇÃO DAS CAPACIDADES (TIPOS)
// ---

pub struct CapCreatePermission;
impl CapabilityDef for CapCreatePermission {
    fn capability() -> Capability { Capability::PermissionsCreate }
}

pub struct CapReadOwnPermissions;
impl CapabilityDef for CapReadOwnPermissions {
    fn capability() -> Capability { Capability::PermissionsReadOwn }
}

pub struct CapReadAllPermissions;
impl CapabilityDef for CapReadAllPermissions {
    fn capability() -> Capability { Capability::PermissionsReadAll }
}

pub struct CapDecidePermissions;
impl CapabilityDef for CapDecidePermissions {
    fn capability() -> Capability { Capability::PermissionsDecide }
}

pub struct CapScan;
impl CapabilityDef for CapScan {
    fn capability() -> Capability { Capability::PermissionsScan }
}

pub struct CapManageUsers;
impl CapabilityDef for CapManageUsers {
    fn capability() -> Capability { Capability::UsersManage }
}

pub struct CapReadReports;
impl CapabilityDef for CapReadReports {
    fn capability() -> Capability { Capability::ReportsRead }
}
