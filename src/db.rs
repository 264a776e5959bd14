use std::sync::Arc;

use sqlx::PgPool;

pub mod department_repo;
pub use department_repo::{DepartmentRepository, MemoryDepartmentRepository, PgDepartmentRepository};
pub mod permission_repo;
pub use permission_repo::{MemoryPermissionRepository, PermissionRepository, PgPermissionRepository};
pub mod user_repo;
pub use user_repo::{MemoryUserRepository, PgUserRepository, UserRepository};
pub mod session_store;
pub use session_store::SessionStore;
pub mod seed;

// Os repositórios que os serviços recebem, atrás dos traits
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub permissions: Arc<dyn PermissionRepository>,
    pub departments: Arc<dyn DepartmentRepository>,
}

impl Repositories {
    /// Backend em memória (padrão, sem DATABASE_URL).
    pub fn memory() -> Self {
        Self {
            users: Arc::new(MemoryUserRepository::new()),
            permissions: Arc::new(MemoryPermissionRepository::new()),
            departments: Arc::new(MemoryDepartmentRepository::new(seed::departments())),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(pool.clone())),
            permissions: Arc::new(PgPermissionRepository::new(pool.clone())),
            departments: Arc::new(PgDepartmentRepository::new(pool)),
        }
    }
}
