// src/services/user_service.rs

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{DepartmentRepository, Repositories, UserRepository},
    models::{
        auth::{avatar_url, User, UserPayload},
        department::Department,
    },
    services::auth::hash_password,
};

// Gestão de usuários (admin) e a tabela de departamentos
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    departments: Arc<dyn DepartmentRepository>,
}

impl UserService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            users: repos.users.clone(),
            departments: repos.departments.clone(),
        }
    }

    pub async fn list(&self, search: Option<&str>) -> Result<Vec<User>, AppError> {
        let users = self.users.list().await?;
        Ok(match search.map(str::trim).filter(|t| !t.is_empty()) {
            Some(term) => users.into_iter().filter(|u| u.matches(term)).collect(),
            None => users,
        })
    }

    pub async fn get(&self, id: &str) -> Result<User, AppError> {
        self.users.find_by_id(id).await?.ok_or(AppError::UserNotFound)
    }

    pub async fn create(&self, payload: &UserPayload) -> Result<User, AppError> {
        let payload = payload.normalized();
        payload.validate()?;
        self.ensure_department(payload.department_id.as_deref()).await?;

        let password_hash = match payload.password.as_deref() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let user = User {
            id: format!("user-{}", Uuid::new_v4().simple()),
            name: payload.name.clone(),
            email: payload.email.clone(),
            role: payload.role,
            department_id: payload.department_id.clone(),
            profile_image: Some(avatar_url(&payload.name)),
            password_hash,
        };
        self.users.insert(&user).await?;

        tracing::info!("👤 Usuário {} ({}) criado", user.email, user.role.as_str());
        Ok(user)
    }

    /// Senha ausente mantém a atual.
    pub async fn update(&self, id: &str, payload: &UserPayload) -> Result<User, AppError> {
        let payload = payload.normalized();
        payload.validate()?;
        let existing = self.get(id).await?;
        self.ensure_department(payload.department_id.as_deref()).await?;

        let password_hash = match payload.password.as_deref() {
            Some(password) => Some(hash_password(password).await?),
            None => existing.password_hash,
        };

        let user = User {
            id: existing.id,
            name: payload.name.clone(),
            email: payload.email.clone(),
            role: payload.role,
            department_id: payload.department_id.clone(),
            profile_image: existing.profile_image,
            password_hash,
        };
        self.users.update(&user).await?;

        tracing::info!("✏️ Usuário {} atualizado", user.id);
        Ok(user)
    }

    pub async fn delete(&self, id: &str, actor: &User) -> Result<(), AppError> {
        if actor.id == id {
            return Err(AppError::CannotDeleteSelf);
        }
        if !self.users.delete(id).await? {
            return Err(AppError::UserNotFound);
        }
        tracing::info!("🗑️ Usuário {} removido por {}", id, actor.id);
        Ok(())
    }

    // --- DEPARTAMENTOS ---

    pub async fn departments(&self) -> Result<Vec<Department>, AppError> {
        self.departments.list().await
    }

    pub async fn department(&self, id: &str) -> Result<Department, AppError> {
        self.departments
            .find_by_id(id)
            .await?
            .ok_or(AppError::DepartmentNotFound)
    }

    async fn ensure_department(&self, id: Option<&str>) -> Result<(), AppError> {
        if let Some(id) = id {
            if self.departments.find_by_id(id).await?.is_none() {
                return Err(AppError::field(
                    "departmentId",
                    "unknown_department",
                    "validation.unknown_department",
                ));
            }
        }
        Ok(())
    }
}
