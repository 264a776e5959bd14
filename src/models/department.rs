// src/models/department.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// Tabela de referência, somente leitura
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Department {
    #[schema(example = "dept-2")]
    pub id: String,
    #[schema(example = "Engineering")]
    pub name: String,
}
