// src/services/auth.rs

use std::{sync::Arc, time::Duration};

use bcrypt::{hash, verify};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{SessionStore, UserRepository},
    models::auth::{Claims, User},
};

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<SessionStore>,
    jwt_secret: String,
    token_ttl: chrono::Duration,
    login_delay: Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<SessionStore>,
        jwt_secret: String,
        token_ttl: chrono::Duration,
        login_delay: Duration,
    ) -> Self {
        Self { users, sessions, jwt_secret, token_ttl, login_delay }
    }

    /// Retorna o token e o usuário autenticado.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), AppError> {
        // Latência simulada do login
        if !self.login_delay.is_zero() {
            tokio::time::sleep(self.login_delay).await;
        }

        let user = self
            .users
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let is_password_valid = match user.password_hash.clone() {
            Some(password_hash) => {
                let password_clone = password.to_owned();
                // Executa a verificação em um thread separado
                tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash))
                    .await
                    .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??
            }
            // Contas de demonstração aceitam qualquer senha não vazia
            None => !password.is_empty(),
        };

        if !is_password_valid {
            tracing::warn!("🔒 Login recusado para {}", email);
            return Err(AppError::InvalidCredentials);
        }

        let now = Utc::now();
        let expires_at = now + self.token_ttl;
        let session_key = Uuid::new_v4().to_string();
        let snapshot = serde_json::to_string(&user).map_err(anyhow::Error::from)?;
        self.sessions.put(&session_key, snapshot, expires_at).await;

        let token = self.create_token(&user, &session_key, now, expires_at)?;
        tracing::info!("🔑 {} ({}) entrou", user.email, user.role.as_str());
        Ok((token, user))
    }

    /// Valida o JWT e a sessão; devolve o usuário atual e a chave da sessão.
    pub async fn validate_token(&self, token: &str) -> Result<(User, String), AppError> {
        let key = DecodingKey::from_secret(self.jwt_secret.as_ref());
        let claims = match decode::<Claims>(token, &key, &Validation::default()) {
            Ok(token_data) => token_data.claims,
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
                self.drop_expired_session(token, &key).await;
                return Err(AppError::InvalidToken);
            }
            Err(_) => return Err(AppError::InvalidToken),
        };

        let stored = self
            .sessions
            .get(&claims.jti)
            .await
            .ok_or(AppError::InvalidToken)?;

        let snapshot: User = match serde_json::from_str(&stored) {
            Ok(user) => user,
            Err(e) => {
                // Sessão ilegível conta como deslogado
                tracing::error!("🔥 Sessão {} corrompida: {}", claims.jti, e);
                self.sessions.remove(&claims.jti).await;
                return Err(AppError::InvalidToken);
            }
        };

        if snapshot.id != claims.sub {
            self.sessions.remove(&claims.jti).await;
            return Err(AppError::InvalidToken);
        }

        match self.users.find_by_id(&snapshot.id).await? {
            Some(user) => Ok((user, claims.jti)),
            None => {
                self.sessions.remove(&claims.jti).await;
                Err(AppError::InvalidToken)
            }
        }
    }

    pub async fn logout(&self, session_key: &str) -> bool {
        let removed = self.sessions.remove(session_key).await;
        tracing::info!("👋 Sessão encerrada ({} ativas)", self.sessions.len().await);
        removed
    }

    // Token vencido mas assinado por nós: a sessão dele sai do store
    async fn drop_expired_session(&self, token: &str, key: &DecodingKey) {
        let mut validation = Validation::default();
        validation.validate_exp = false;
        if let Ok(token_data) = decode::<Claims>(token, key, &validation) {
            if self.sessions.remove(&token_data.claims.jti).await {
                tracing::info!("⌛ Sessão {} expirada removida", token_data.claims.jti);
            }
        }
    }

    fn create_token(
        &self,
        user: &User,
        session_key: &str,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = Claims {
            sub: user.id.clone(),
            role: user.role,
            jti: session_key.to_string(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password_clone = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{seed, MemoryUserRepository};

    async fn service() -> (AuthService, Arc<SessionStore>, Arc<dyn UserRepository>) {
        service_with_ttl(chrono::Duration::hours(1)).await
    }

    async fn service_with_ttl(
        ttl: chrono::Duration,
    ) -> (AuthService, Arc<SessionStore>, Arc<dyn UserRepository>) {
        let users: Arc<dyn UserRepository> = Arc::new(MemoryUserRepository::new());
        for user in seed::users() {
            users.insert(&user).await.unwrap();
        }
        let sessions = Arc::new(SessionStore::new());
        let auth = AuthService::new(
            users.clone(),
            sessions.clone(),
            "segredo-de-teste".into(),
            ttl,
            Duration::ZERO,
        );
        (auth, sessions, users)
    }

    #[tokio::test]
    async fn demo_account_logs_in_case_insensitively() {
        let (auth, sessions, _) = service().await;

        let (token, user) = auth.login("Admin@Example.com", "anything").await.unwrap();
        assert_eq!(user.id, "user-1");
        assert_eq!(sessions.len().await, 1);

        let (current, _) = auth.validate_token(&token).await.unwrap();
        assert_eq!(current, user);
    }

    #[tokio::test]
    async fn unknown_email_or_empty_password_is_rejected() {
        let (auth, sessions, _) = service().await;

        assert!(matches!(
            auth.login("nobody@example.com", "x").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("john@example.com", "").await,
            Err(AppError::InvalidCredentials)
        ));
        assert_eq!(sessions.len().await, 0);
    }

    #[tokio::test]
    async fn hashed_password_must_match() {
        let (auth, _, users) = service().await;
        let mut rina = seed::users().remove(1);
        rina.id = "user-9".into();
        rina.email = "rina@example.com".into();
        rina.password_hash = Some(hash_password("segredo1").await.unwrap());
        users.insert(&rina).await.unwrap();

        assert!(matches!(
            auth.login("rina@example.com", "errada").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(auth.login("rina@example.com", "segredo1").await.is_ok());
    }

    #[tokio::test]
    async fn logout_invalidates_token() {
        let (auth, _, _) = service().await;
        let (token, _) = auth.login("john@example.com", "x").await.unwrap();
        let (_, key) = auth.validate_token(&token).await.unwrap();

        assert!(auth.logout(&key).await);
        assert!(matches!(auth.validate_token(&token).await, Err(AppError::InvalidToken)));
        assert!(!auth.logout(&key).await);
    }

    #[tokio::test]
    async fn corrupt_session_is_removed_and_treated_as_logged_out() {
        let (auth, sessions, _) = service().await;
        let (token, _) = auth.login("jane@example.com", "x").await.unwrap();
        let (_, key) = auth.validate_token(&token).await.unwrap();

        sessions
            .put(&key, "{não é json".into(), Utc::now() + chrono::Duration::hours(1))
            .await;
        assert!(matches!(auth.validate_token(&token).await, Err(AppError::InvalidToken)));
        assert_eq!(sessions.get(&key).await, None);
    }

    #[tokio::test]
    async fn deleted_user_loses_session() {
        let (auth, sessions, users) = service().await;
        let (token, _) = auth.login("jane@example.com", "x").await.unwrap();

        users.delete("user-3").await.unwrap();
        assert!(matches!(auth.validate_token(&token).await, Err(AppError::InvalidToken)));
        assert_eq!(sessions.len().await, 0);
    }

    #[tokio::test]
    async fn expired_logins_leave_no_sessions_behind() {
        let (auth, sessions, _) = service_with_ttl(chrono::Duration::hours(-2)).await;

        for _ in 0..3 {
            let (token, _) = auth.login("john@example.com", "x").await.unwrap();
            assert!(matches!(auth.validate_token(&token).await, Err(AppError::InvalidToken)));
        }
        assert_eq!(sessions.len().await, 0);
    }

    #[tokio::test]
    async fn expired_token_removes_its_session() {
        let (auth, sessions, _) = service().await;
        let (token, _) = auth.login("jane@example.com", "x").await.unwrap();
        let (user, key) = auth.validate_token(&token).await.unwrap();

        // Mesmo jti, assinado com exp no passado
        let past = Utc::now() - chrono::Duration::hours(2);
        let stale = auth
            .create_token(&user, &key, past - chrono::Duration::hours(1), past)
            .unwrap();
        assert!(matches!(auth.validate_token(&stale).await, Err(AppError::InvalidToken)));
        assert_eq!(sessions.len().await, 0);
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() {
        let (auth, _, _) = service().await;
        assert!(matches!(auth.validate_token("abc.def.ghi").await, Err(AppError::InvalidToken)));
    }
}
