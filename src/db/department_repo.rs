// src/db/department_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{common::error::AppError, models::department::Department};

// Tabela de referência: só leitura
#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Department>, AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Department>, AppError>;
}

pub struct MemoryDepartmentRepository {
    departments: Vec<Department>,
}

impl MemoryDepartmentRepository {
    pub fn new(departments: Vec<Department>) -> Self {
        Self { departments }
    }
}

#[async_trait]
impl DepartmentRepository for MemoryDepartmentRepository {
    async fn list(&self) -> Result<Vec<Department>, AppError> {
        Ok(self.departments.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Department>, AppError> {
        Ok(self.departments.iter().find(|d| d.id == id).cloned())
    }
}

// Os departamentos entram pela migration
#[derive(Clone)]
pub struct PgDepartmentRepository {
    pool: PgPool,
}

impl PgDepartmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DepartmentRepository for PgDepartmentRepository {
    async fn list(&self) -> Result<Vec<Department>, AppError> {
        let departments = sqlx::query_as::<_, Department>("SELECT id, name FROM departments ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(departments)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Department>, AppError> {
        let department = sqlx::query_as::<_, Department>("SELECT id, name FROM departments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(department)
    }
}
