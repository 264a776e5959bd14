// src/services/permission_service.rs

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{PermissionRepository, Repositories, UserRepository},
    models::{
        access::Capability,
        auth::User,
        permission::{
            CreatePermissionPayload, Permission, PermissionAction, PermissionListQuery,
            PermissionWithUser,
        },
    },
    services::qr_service::QrService,
};

#[derive(Clone)]
pub struct PermissionService {
    repo: Arc<dyn PermissionRepository>,
    users: Arc<dyn UserRepository>,
    qr: QrService,
    // Serializa ler-validar-gravar das transições
    write_lock: Arc<Mutex<()>>,
}

impl PermissionService {
    pub fn new(repos: &Repositories, qr: QrService) -> Self {
        Self {
            repo: repos.permissions.clone(),
            users: repos.users.clone(),
            qr,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    // --- CRIAÇÃO ---

    pub async fn create(
        &self,
        owner_id: &str,
        payload: &CreatePermissionPayload,
    ) -> Result<Permission, AppError> {
        // Valida o formulário antes de qualquer consulta
        payload.check()?;

        if self.users.find_by_id(owner_id).await?.is_none() {
            return Err(AppError::field("userId", "unknown_owner", "validation.unknown_owner"));
        }

        let id = format!("perm-{}", Uuid::new_v4().simple());
        let permission = Permission::new_request(id, owner_id, payload, Utc::now())?;
        self.repo.insert(&permission).await?;

        tracing::info!(
            "📝 Permissão {} ({}) criada por {}",
            permission.id,
            permission.kind.as_str(),
            owner_id
        );
        Ok(permission)
    }

    // --- CONSULTAS ---

    pub async fn find(&self, id: &str) -> Result<Option<Permission>, AppError> {
        self.repo.find_by_id(id).await
    }

    pub async fn get(&self, id: &str) -> Result<Permission, AppError> {
        self.repo.find_by_id(id).await?.ok_or(AppError::PermissionNotFound)
    }

    /// Visível para o dono e para quem lê todas as permissões.
    pub async fn get_for(&self, id: &str, viewer: &User) -> Result<PermissionWithUser, AppError> {
        let permission = self.get(id).await?;
        if permission.user_id != viewer.id && !viewer.role.can(Capability::PermissionsReadAll) {
            // Não revela a existência de permissões alheias
            return Err(AppError::PermissionNotFound);
        }
        let owner = self.users.find_by_id(&permission.user_id).await?;
        Ok(with_owner(permission, owner))
    }

    pub async fn list(&self, query: &PermissionListQuery) -> Result<Vec<PermissionWithUser>, AppError> {
        let permissions = match query.status {
            Some(status) => self.repo.list_by_status(status).await?,
            None => self.repo.list().await?,
        };
        let owners = self.owners().await?;

        let term = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty());
        Ok(permissions
            .into_iter()
            .filter(|p| term.is_none_or(|t| p.matches(owners.get(&p.user_id), t)))
            .map(|p| {
                let owner = owners.get(&p.user_id).cloned();
                with_owner(p, owner)
            })
            .collect())
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Permission>, AppError> {
        self.repo.list_by_user(user_id).await
    }

    /// As `count` mais recentes por `createdAt`.
    pub async fn recent(&self, count: usize) -> Result<Vec<PermissionWithUser>, AppError> {
        let mut permissions = self.repo.list().await?;
        permissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        permissions.truncate(count);

        let owners = self.owners().await?;
        Ok(permissions
            .into_iter()
            .map(|p| {
                let owner = owners.get(&p.user_id).cloned();
                with_owner(p, owner)
            })
            .collect())
    }

    async fn owners(&self) -> Result<HashMap<String, User>, AppError> {
        Ok(self
            .users
            .list()
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect())
    }

    // --- TRANSIÇÕES ---

    pub async fn approve(&self, id: &str, approver: &User) -> Result<Permission, AppError> {
        self.apply(id, PermissionAction::Approve, approver).await
    }

    pub async fn reject(&self, id: &str, admin: &User) -> Result<Permission, AppError> {
        self.apply(id, PermissionAction::Reject, admin).await
    }

    pub async fn check_in(&self, id: &str, guard: &User) -> Result<Permission, AppError> {
        self.apply(id, PermissionAction::CheckIn, guard).await
    }

    pub async fn check_out(&self, id: &str, guard: &User) -> Result<Permission, AppError> {
        self.apply(id, PermissionAction::CheckOut, guard).await
    }

    /// Único caminho de escrita do ciclo de vida.
    async fn apply(
        &self,
        id: &str,
        action: PermissionAction,
        actor: &User,
    ) -> Result<Permission, AppError> {
        let _guard = self.write_lock.lock().await;

        let mut permission = self.get(id).await?;
        let now = Utc::now();

        let outcome = match action {
            PermissionAction::Approve => {
                let qr_code = self.qr.image_url(&permission.id);
                permission.approve(&actor.id, qr_code, now)
            }
            PermissionAction::Reject => permission.reject(now),
            PermissionAction::CheckIn => permission.check_in(now),
            PermissionAction::CheckOut => permission.check_out(now),
        };

        if let Err(e) = outcome {
            tracing::warn!(
                "⛔ {} recusado para {} ({}): {}",
                action.as_str(),
                id,
                permission.status.as_str(),
                e
            );
            return Err(e);
        }

        self.repo.update(&permission).await?;

        tracing::info!(
            "✅ Permissão {} -> {} ({} por {})",
            permission.id,
            permission.status.as_str(),
            action.as_str(),
            actor.id
        );
        Ok(permission)
    }

    // --- QR ---

    pub async fn qr_png(&self, id: &str, viewer: &User) -> Result<Vec<u8>, AppError> {
        let permission = self.get_for(id, viewer).await?.permission;
        if permission.qr_code.is_none() || !permission.status.is_scannable() {
            return Err(AppError::QrUnavailable);
        }
        self.qr.render_png(&permission.id)
    }
}

pub fn with_owner(permission: Permission, owner: Option<User>) -> PermissionWithUser {
    let duration = permission.duration();
    PermissionWithUser { permission, user: owner, duration }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::seed,
        models::{
            auth::Role,
            permission::{PermissionStatus, PermissionType},
        },
    };
    use chrono::{DateTime, TimeZone};

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()
    }

    fn qr() -> QrService {
        QrService::new("https://api.qrserver.com/v1/create-qr-code/", 150)
    }

    async fn setup() -> (PermissionService, Repositories) {
        let repos = Repositories::memory();
        for user in seed::users() {
            repos.users.insert(&user).await.unwrap();
        }
        (PermissionService::new(&repos, qr()), repos)
    }

    async fn user(repos: &Repositories, id: &str) -> User {
        repos.users.find_by_id(id).await.unwrap().unwrap()
    }

    fn form(start: u32, end: u32) -> CreatePermissionPayload {
        CreatePermissionPayload {
            kind: PermissionType::Sick,
            reason: "Consulta médica".into(),
            start_time: at(start),
            end_time: at(end),
        }
    }

    async fn insert_pending(repos: &Repositories, id: &str) {
        let p = Permission::new_request(id.into(), "user-2", &form(9, 17), at(8)).unwrap();
        repos.permissions.insert(&p).await.unwrap();
    }

    #[tokio::test]
    async fn create_rejects_inverted_window_without_storing() {
        let (service, repos) = setup().await;

        let err = service.create("user-2", &form(9, 8)).await.unwrap_err();
        match err {
            AppError::ValidationError(errors) => {
                assert!(errors.field_errors().contains_key("endTime"));
            }
            other => panic!("esperava validação, veio {:?}", other),
        }
        assert!(repos.permissions.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_stores_pending_request_for_owner() {
        let (service, repos) = setup().await;

        let created = service.create("user-2", &form(9, 17)).await.unwrap();
        assert_eq!(created.status, PermissionStatus::Pending);
        assert!(created.id.starts_with("perm-"));

        let mine = service.list_for_user("user-2").await.unwrap();
        assert_eq!(mine, vec![created]);
        assert!(service.list_for_user("user-3").await.unwrap().is_empty());
        assert_eq!(repos.permissions.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_requires_existing_owner() {
        let (service, _) = setup().await;
        assert!(matches!(
            service.create("user-404", &form(9, 17)).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn approving_permission_seven_stores_qr_url() {
        let (service, repos) = setup().await;
        insert_pending(&repos, "permission-7").await;
        let admin = user(&repos, "user-1").await;

        let approved = service.approve("permission-7", &admin).await.unwrap();
        assert_eq!(approved.status, PermissionStatus::Approved);
        assert_eq!(approved.approved_by.as_deref(), Some("user-1"));
        assert!(approved.approved_at.is_some());
        assert!(approved.qr_code.as_deref().unwrap().contains("permission-7"));

        // Persistido
        assert_eq!(service.get("permission-7").await.unwrap(), approved);
    }

    #[tokio::test]
    async fn second_decision_fails_and_leaves_record_untouched() {
        let (service, repos) = setup().await;
        insert_pending(&repos, "permission-3").await;
        let admin = user(&repos, "user-1").await;

        let rejected = service.reject("permission-3", &admin).await.unwrap();
        assert!(rejected.qr_code.is_none());

        assert!(matches!(
            service.approve("permission-3", &admin).await,
            Err(AppError::InvalidTransition { .. })
        ));
        assert_eq!(service.get("permission-3").await.unwrap(), rejected);
    }

    #[tokio::test]
    async fn check_in_then_out_completes_once() {
        let (service, repos) = setup().await;
        insert_pending(&repos, "permission-9").await;
        let admin = user(&repos, "user-1").await;
        let guard = user(&repos, "user-4").await;

        assert!(matches!(
            service.check_out("permission-9", &guard).await,
            Err(AppError::InvalidTransition { .. }) | Err(AppError::NotCheckedIn)
        ));

        service.approve("permission-9", &admin).await.unwrap();
        let checked_in = service.check_in("permission-9", &guard).await.unwrap();
        assert!(checked_in.check_in_time.is_some());
        assert!(matches!(
            service.check_in("permission-9", &guard).await,
            Err(AppError::AlreadyCheckedIn)
        ));

        let done = service.check_out("permission-9", &guard).await.unwrap();
        assert_eq!(done.status, PermissionStatus::Completed);
        assert!(matches!(
            service.check_out("permission-9", &guard).await,
            Err(AppError::AlreadyCheckedOut)
        ));
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (service, repos) = setup().await;
        let admin = user(&repos, "user-1").await;
        assert!(matches!(
            service.approve("permission-404", &admin).await,
            Err(AppError::PermissionNotFound)
        ));
    }

    #[tokio::test]
    async fn concurrent_approvals_have_a_single_winner() {
        let (service, repos) = setup().await;
        insert_pending(&repos, "permission-1").await;
        let admin = user(&repos, "user-1").await;

        let (a, b) = tokio::join!(
            service.approve("permission-1", &admin),
            service.reject("permission-1", &admin)
        );
        assert!(a.is_ok() ^ b.is_ok());
    }

    #[tokio::test]
    async fn search_and_recent_attach_owners() {
        let (service, repos) = setup().await;
        for p in seed::permissions(&qr(), Utc::now()) {
            repos.permissions.insert(&p).await.unwrap();
        }

        let johns = service
            .list(&PermissionListQuery { search: Some("john".into()), status: None })
            .await
            .unwrap();
        assert_eq!(johns.len(), 17);
        assert!(johns.iter().all(|p| p.user.as_ref().unwrap().name == "John Employee"));

        let pending = service
            .list(&PermissionListQuery { search: None, status: Some(PermissionStatus::Pending) })
            .await
            .unwrap();
        assert!(pending.iter().all(|p| p.permission.status == PermissionStatus::Pending));

        let recent = service.recent(5).await.unwrap();
        assert_eq!(recent.len(), 5);
        assert!(recent
            .windows(2)
            .all(|w| w[0].permission.created_at >= w[1].permission.created_at));
    }

    #[tokio::test]
    async fn employees_only_see_their_own_permissions() {
        let (service, repos) = setup().await;
        insert_pending(&repos, "permission-2").await;
        let jane = user(&repos, "user-3").await;
        let john = user(&repos, "user-2").await;
        let guard = user(&repos, "user-4").await;

        assert!(matches!(
            service.get_for("permission-2", &jane).await,
            Err(AppError::PermissionNotFound)
        ));
        assert!(service.get_for("permission-2", &john).await.is_ok());
        assert_eq!(guard.role, Role::Security);
        assert!(service.get_for("permission-2", &guard).await.is_ok());
    }

    #[tokio::test]
    async fn qr_png_only_after_approval() {
        let (service, repos) = setup().await;
        insert_pending(&repos, "permission-5").await;
        let admin = user(&repos, "user-1").await;
        let john = user(&repos, "user-2").await;

        assert!(matches!(
            service.qr_png("permission-5", &john).await,
            Err(AppError::QrUnavailable)
        ));
        service.approve("permission-5", &admin).await.unwrap();
        let png = service.qr_png("permission-5", &john).await.unwrap();
        assert!(!png.is_empty());
    }
}
