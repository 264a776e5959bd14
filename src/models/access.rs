// src/models/access.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::auth::Role;

// Ações protegidas, verificadas uma única vez na borda HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
pub enum Capability {
    #[serde(rename = "permissions:create")]
    PermissionsCreate,
    #[serde(rename = "permissions:read_own")]
    PermissionsReadOwn,
    #[serde(rename = "permissions:read_all")]
    PermissionsReadAll,
    #[serde(rename = "permissions:decide")]
    PermissionsDecide,
    #[serde(rename = "permissions:scan")]
    PermissionsScan,
    #[serde(rename = "users:manage")]
    UsersManage,
    #[serde(rename = "reports:read")]
    ReportsRead,
}

impl Capability {
    pub fn slug(self) -> &'static str {
        match self {
            Capability::PermissionsCreate => "permissions:create",
            Capability::PermissionsReadOwn => "permissions:read_own",
            Capability::PermissionsReadAll => "permissions:read_all",
            Capability::PermissionsDecide => "permissions:decide",
            Capability::PermissionsScan => "permissions:scan",
            Capability::UsersManage => "users:manage",
            Capability::ReportsRead => "reports:read",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl Role {
    /// Tabela de capacidades por perfil.
    pub fn capabilities(self) -> &'static [Capability] {
        use Capability::*;

        match self {
            Role::Admin => &[PermissionsReadAll, PermissionsDecide, UsersManage, ReportsRead],
            Role::Employee => &[PermissionsCreate, PermissionsReadOwn],
            Role::Security => &[PermissionsReadAll, PermissionsScan],
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

// Resultado do portão de acesso para uma rota do front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    Render { path: String },
    Redirect { to: String },
    NotFound,
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub path: String,
}
