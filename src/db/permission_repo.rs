// src/db/permission_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::{
    common::error::AppError,
    models::permission::{Permission, PermissionStatus},
};

/// Contrato de persistência das permissões. Não existe remoção.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Permission>, AppError>;

    /// Ordem de inserção.
    async fn list(&self) -> Result<Vec<Permission>, AppError>;

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Permission>, AppError>;

    async fn list_by_status(&self, status: PermissionStatus) -> Result<Vec<Permission>, AppError>;

    async fn insert(&self, permission: &Permission) -> Result<(), AppError>;

    /// Grava o registro inteiro; erro se o id não existe.
    async fn update(&self, permission: &Permission) -> Result<(), AppError>;
}

// --- Memória ---

#[derive(Default)]
pub struct MemoryPermissionRepository {
    permissions: RwLock<Vec<Permission>>,
}

impl MemoryPermissionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionRepository for MemoryPermissionRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Permission>, AppError> {
        let permissions = self.permissions.read().await;
        Ok(permissions.iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Permission>, AppError> {
        Ok(self.permissions.read().await.clone())
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Permission>, AppError> {
        let permissions = self.permissions.read().await;
        Ok(permissions.iter().filter(|p| p.user_id == user_id).cloned().collect())
    }

    async fn list_by_status(&self, status: PermissionStatus) -> Result<Vec<Permission>, AppError> {
        let permissions = self.permissions.read().await;
        Ok(permissions.iter().filter(|p| p.status == status).cloned().collect())
    }

    async fn insert(&self, permission: &Permission) -> Result<(), AppError> {
        self.permissions.write().await.push(permission.clone());
        Ok(())
    }

    async fn update(&self, permission: &Permission) -> Result<(), AppError> {
        let mut permissions = self.permissions.write().await;
        let slot = permissions
            .iter_mut()
            .find(|p| p.id == permission.id)
            .ok_or(AppError::PermissionNotFound)?;
        *slot = permission.clone();
        Ok(())
    }
}

// --- PostgreSQL ---

const PERMISSION_COLUMNS: &str = "id, user_id, kind, reason, start_time, end_time, status, created_at, \
     approved_at, approved_by, check_in_time, check_out_time, qr_code";

#[derive(Clone)]
pub struct PgPermissionRepository {
    pool: PgPool,
}

impl PgPermissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionRepository for PgPermissionRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Permission>, AppError> {
        let permission = sqlx::query_as::<_, Permission>(&format!(
            "SELECT {} FROM permissions WHERE id = $1",
            PERMISSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(permission)
    }

    async fn list(&self) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>(&format!(
            "SELECT {} FROM permissions ORDER BY seq",
            PERMISSION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>(&format!(
            "SELECT {} FROM permissions WHERE user_id = $1 ORDER BY seq",
            PERMISSION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    async fn list_by_status(&self, status: PermissionStatus) -> Result<Vec<Permission>, AppError> {
        let permissions = sqlx::query_as::<_, Permission>(&format!(
            "SELECT {} FROM permissions WHERE status = $1 ORDER BY seq",
            PERMISSION_COLUMNS
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(permissions)
    }

    async fn insert(&self, p: &Permission) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO permissions (
                id, user_id, kind, reason, start_time, end_time, status, created_at,
                approved_at, approved_by, check_in_time, check_out_time, qr_code
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(&p.id)
        .bind(&p.user_id)
        .bind(p.kind)
        .bind(&p.reason)
        .bind(p.start_time)
        .bind(p.end_time)
        .bind(p.status)
        .bind(p.created_at)
        .bind(p.approved_at)
        .bind(&p.approved_by)
        .bind(p.check_in_time)
        .bind(p.check_out_time)
        .bind(&p.qr_code)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, p: &Permission) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE permissions
            SET status = $2, approved_at = $3, approved_by = $4,
                check_in_time = $5, check_out_time = $6, qr_code = $7
            WHERE id = $1
            "#,
        )
        .bind(&p.id)
        .bind(p.status)
        .bind(p.approved_at)
        .bind(&p.approved_by)
        .bind(p.check_in_time)
        .bind(p.check_out_time)
        .bind(&p.qr_code)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::PermissionNotFound);
        }
        Ok(())
    }
}
