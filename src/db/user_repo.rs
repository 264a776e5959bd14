// src/db/user_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::{common::error::AppError, models::auth::User};

/// Contrato de persistência de usuários. Os serviços só conhecem este trait.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    /// Comparação de e-mail sem diferenciar maiúsculas.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn list(&self) -> Result<Vec<User>, AppError>;

    async fn insert(&self, user: &User) -> Result<(), AppError>;

    async fn update(&self, user: &User) -> Result<(), AppError>;

    /// `false` se o usuário não existia.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;
}

// --- Memória ---

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.users.read().await.clone())
    }

    async fn insert(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::EmailAlreadyExists);
        }
        users.push(user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AppError::EmailAlreadyExists);
        }
        let slot = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(AppError::UserNotFound)?;
        *slot = user.clone();
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }
}

// --- PostgreSQL ---

const USER_COLUMNS: &str = "id, name, email, role, department_id, profile_image, password_hash";

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Violação do índice único de e-mail vira erro de domínio
fn map_unique_email(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::EmailAlreadyExists;
        }
    }
    e.into()
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at, id",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn insert(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, role, department_id, profile_image, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(&user.department_id)
        .bind(&user.profile_image)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await
        .map_err(map_unique_email)?;
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, role = $4, department_id = $5,
                profile_image = $6, password_hash = $7, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(&user.department_id)
        .bind(&user.profile_image)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await
        .map_err(map_unique_email)?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.into(),
            name: "Teste".into(),
            email: email.into(),
            role: Role::Employee,
            department_id: None,
            profile_image: None,
            password_hash: None,
        }
    }

    #[tokio::test]
    async fn email_lookup_ignores_case() {
        let repo = MemoryUserRepository::new();
        repo.insert(&user("user-9", "Rina@Example.com")).await.unwrap();

        let found = repo.find_by_email("rina@example.COM").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some("user-9".to_string()));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_on_insert_and_update() {
        let repo = MemoryUserRepository::new();
        repo.insert(&user("a", "a@example.com")).await.unwrap();
        repo.insert(&user("b", "b@example.com")).await.unwrap();

        assert!(matches!(
            repo.insert(&user("c", "A@example.com")).await,
            Err(AppError::EmailAlreadyExists)
        ));
        assert!(matches!(
            repo.update(&user("b", "a@example.com")).await,
            Err(AppError::EmailAlreadyExists)
        ));
        // O próprio usuário pode manter o e-mail
        repo.update(&user("b", "B@example.com")).await.unwrap();
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let repo = MemoryUserRepository::new();
        repo.insert(&user("a", "a@example.com")).await.unwrap();

        assert!(repo.delete("a").await.unwrap());
        assert!(!repo.delete("a").await.unwrap());
        assert!(repo.list().await.unwrap().is_empty());
    }
}
