// src/middleware/auth.rs

use axum::{
    body::Body,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::User,
};

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

// Exige um token válido e coloca o usuário e a sessão nas extensions
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

    let (user, session_key) = app_state
        .auth_service
        .validate_token(&token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    request.extensions_mut().insert(CurrentSession(session_key));
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

// Rota sem o auth_guard: responde como token inválido
async fn missing_auth<S>(parts: &mut Parts, state: &S) -> ApiError
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    let app_state = AppState::from_ref(state);
    let Ok(locale) = Locale::from_request_parts(parts, state).await;
    AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthenticatedUser>().cloned() {
            Some(user) => Ok(user),
            None => Err(missing_auth(parts, state).await),
        }
    }
}

// Chave da sessão do token atual (usada no logout)
#[derive(Debug, Clone)]
pub struct CurrentSession(pub String);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<CurrentSession>().cloned() {
            Some(session) => Ok(session),
            None => Err(missing_auth(parts, state).await),
        }
    }
}

/// Usuário opcional, para rotas públicas que mudam conforme o login.
/// Token ausente ou inválido conta como anônimo.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(AuthenticatedUser(user)) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(MaybeUser(Some(user.clone())));
        }

        let Some(token) = bearer_token(&parts.headers) else {
            return Ok(MaybeUser(None));
        };

        let app_state = AppState::from_ref(state);
        match app_state.auth_service.validate_token(&token).await {
            Ok((user, _)) => Ok(MaybeUser(Some(user))),
            Err(e) => {
                tracing::debug!("Token ignorado em rota pública: {}", e);
                Ok(MaybeUser(None))
            }
        }
    }
}
