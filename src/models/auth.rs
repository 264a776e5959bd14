// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

// Os três perfis do sistema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
    Security,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
            Role::Security => "security",
        }
    }

    /// Rota inicial de cada perfil no front end.
    pub fn home_route(self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Employee => "/employee/dashboard",
            Role::Security => "/security/scan",
        }
    }
}

// Representa um usuário vindo do repositório
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(example = "user-2")]
    pub id: String,
    #[schema(example = "John Employee")]
    pub name: String,
    #[schema(example = "john@example.com")]
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "dept-2")]
    pub department_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,

    // Usuários de demonstração não têm senha
    #[serde(skip)]
    #[schema(ignore)]
    pub password_hash: Option<String>,
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "validation.email"))]
    #[schema(example = "admin@example.com")]
    pub email: String,
    #[validate(length(min = 1, message = "validation.password_required"))]
    #[schema(example = "qualquer-coisa")]
    pub password: String,
}

// Resposta de autenticação com o token
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
    #[schema(example = "/admin/dashboard")]
    pub home_route: String,
}

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // Subject (ID do usuário)
    pub role: Role,
    pub jti: String,  // Chave da sessão guardada no SessionStore
    pub exp: usize,
    pub iat: usize,
}

// Payload de criação/edição de usuário (admin)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[validate(length(min = 2, message = "validation.name_min"))]
    #[schema(example = "Rina Employee")]
    pub name: String,

    #[validate(email(message = "validation.email"))]
    #[schema(example = "rina@example.com")]
    pub email: String,

    pub role: Role,

    #[serde(default)]
    pub department_id: Option<String>,

    #[serde(default)]
    #[validate(length(min = 6, message = "validation.password_min"))]
    pub password: Option<String>,
}

impl UserPayload {
    /// Cópia com nome e e-mail aparados; validar sempre esta versão.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct UserSearchQuery {
    pub search: Option<String>,
}

impl User {
    /// Busca do painel de usuários: nome, e-mail ou perfil.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term)
            || self.email.to_lowercase().contains(&term)
            || self.role.as_str().contains(&term)
    }
}

pub fn avatar_url(name: &str) -> String {
    format!(
        "https://ui-avatars.com/api/?name={}&background=0D8ABC&color=fff",
        urlencoding::encode(name)
    )
}
