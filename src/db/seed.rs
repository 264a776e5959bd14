// src/db/seed.rs

use chrono::{DateTime, Duration, Utc};

use crate::{
    common::error::AppError,
    db::Repositories,
    models::{
        auth::{avatar_url, Role, User},
        department::Department,
        permission::{Permission, PermissionStatus, PermissionType},
    },
    services::qr_service::QrService,
};

pub const SEED_PERMISSIONS: usize = 50;

pub fn departments() -> Vec<Department> {
    [
        ("dept-1", "Human Resources"),
        ("dept-2", "Engineering"),
        ("dept-3", "Marketing"),
        ("dept-4", "Finance"),
        ("dept-5", "Operations"),
    ]
    .into_iter()
    .map(|(id, name)| Department { id: id.into(), name: name.into() })
    .collect()
}

pub fn users() -> Vec<User> {
    let user = |id: &str, name: &str, email: &str, role: Role, dept: Option<&str>, color: &str| User {
        id: id.into(),
        name: name.into(),
        email: email.into(),
        role,
        department_id: dept.map(str::to_string),
        profile_image: Some(avatar_url(name).replace("0D8ABC", color)),
        password_hash: None,
    };

    vec![
        user("user-1", "Admin User", "admin@example.com", Role::Admin, None, "0D8ABC"),
        user("user-2", "John Employee", "john@example.com", Role::Employee, Some("dept-2"), "27AE60"),
        user("user-3", "Jane Employee", "jane@example.com", Role::Employee, Some("dept-3"), "8E44AD"),
        user("user-4", "Security Guard", "security@example.com", Role::Security, None, "E74C3C"),
    ]
}

/// Versão determinística do gerador de dados de demonstração.
pub fn permissions(qr: &QrService, now: DateTime<Utc>) -> Vec<Permission> {
    (0..SEED_PERMISSIONS)
        .map(|i| {
            let id = format!("permission-{}", i + 1);
            let kind = PermissionType::ALL[(i / 2) % 4];
            let status = PermissionStatus::ALL[(i + 2) % 4];

            let start_time = now - Duration::days((i % 30) as i64);
            let end_time = start_time + Duration::hours(((i * 7) % 72 + 1) as i64);
            let created_at = start_time - Duration::days((i % 5) as i64);
            let decided_at = created_at + Duration::hours(((i * 5) % 48 + 1) as i64);

            let decided = status != PermissionStatus::Pending;
            let went_through_approval =
                matches!(status, PermissionStatus::Approved | PermissionStatus::Completed);
            let completed = status == PermissionStatus::Completed;

            Permission {
                user_id: if i % 3 == 0 { "user-2" } else { "user-3" }.to_string(),
                kind,
                reason: format!("{} permission reason {}", kind.as_str(), i + 1),
                start_time,
                end_time,
                status,
                created_at,
                approved_at: decided.then_some(decided_at),
                approved_by: went_through_approval.then(|| "user-1".to_string()),
                check_in_time: completed.then_some(start_time),
                check_out_time: completed.then_some(end_time),
                qr_code: went_through_approval.then(|| qr.image_url(&id)),
                id,
            }
        })
        .collect()
}

/// Popula usuários e permissões quando o repositório está vazio.
pub async fn install(repos: &Repositories, qr: &QrService, now: DateTime<Utc>) -> Result<bool, AppError> {
    if !repos.users.list().await?.is_empty() {
        tracing::info!("🌱 Repositório já possui usuários, seed ignorado");
        return Ok(false);
    }

    for user in users() {
        repos.users.insert(&user).await?;
    }
    for permission in permissions(qr, now) {
        repos.permissions.insert(&permission).await?;
    }

    tracing::info!(
        "🌱 Dados de demonstração instalados: {} usuários, {} permissões",
        users().len(),
        SEED_PERMISSIONS
    );
    Ok(true)
}
