// src/services/report_service.rs

use std::{collections::{BTreeMap, HashMap}, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{
    common::error::AppError,
    db::{DepartmentRepository, PermissionRepository, Repositories, UserRepository},
    models::{
        auth::{Role, User},
        permission::{Permission, PermissionStatus},
        report::{DashboardStats, DepartmentCount, PermissionReport, ReportQuery, StatusCounts, TypeCounts, UserStats},
    },
    services::permission_service::with_owner,
};

#[derive(Clone)]
pub struct ReportService {
    permissions: Arc<dyn PermissionRepository>,
    users: Arc<dyn UserRepository>,
    departments: Arc<dyn DepartmentRepository>,
}

impl ReportService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            permissions: repos.permissions.clone(),
            users: repos.users.clone(),
            departments: repos.departments.clone(),
        }
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        let users = self.users.list().await?;
        let permissions = self.permissions.list().await?;
        let counts = count_statuses(&permissions);

        Ok(DashboardStats {
            total_users: users.iter().filter(|u| u.role == Role::Employee).count(),
            total_permissions: permissions.len(),
            pending_permissions: counts.pending,
            approved_permissions: counts.approved,
            rejected_permissions: counts.rejected,
            completed_permissions: counts.completed,
        })
    }

    pub async fn user_stats(&self, user_id: &str) -> Result<UserStats, AppError> {
        let permissions = self.permissions.list_by_user(user_id).await?;
        let counts = count_statuses(&permissions);

        Ok(UserStats {
            total_permissions: permissions.len(),
            pending_permissions: counts.pending,
            approved_permissions: counts.approved,
            rejected_permissions: counts.rejected,
            completed_permissions: counts.completed,
        })
    }

    /// Filtra por termo e período (em `createdAt`) e agrega as contagens.
    pub async fn report(&self, query: &ReportQuery, now: DateTime<Utc>) -> Result<PermissionReport, AppError> {
        let owners: HashMap<String, User> = self
            .users
            .list()
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();
        let departments: HashMap<String, String> = self
            .departments
            .list()
            .await?
            .into_iter()
            .map(|d| (d.id, d.name))
            .collect();

        let term = query
            .search
            .as_deref()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty());
        let since = query.range.since(now);

        let mut permissions: Vec<Permission> = self
            .permissions
            .list()
            .await?
            .into_iter()
            .filter(|p| since.is_none_or(|since| p.created_at >= since))
            .filter(|p| {
                term.as_deref()
                    .is_none_or(|t| report_matches(p, owners.get(&p.user_id), t))
            })
            .collect();
        permissions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut status_counts = StatusCounts::default();
        let mut type_counts = TypeCounts::default();
        let mut by_department: BTreeMap<String, usize> = BTreeMap::new();

        for p in &permissions {
            status_counts.add(p.status);
            type_counts.add(p.kind);

            let department = owners
                .get(&p.user_id)
                .and_then(|u| u.department_id.as_ref())
                .map(|id| departments.get(id).cloned().unwrap_or_else(|| id.clone()))
                .unwrap_or_else(|| "Unknown".to_string());
            *by_department.entry(department).or_default() += 1;
        }

        let department_counts = by_department
            .into_iter()
            .map(|(department, count)| DepartmentCount { department, count })
            .collect();

        Ok(PermissionReport {
            range: query.range,
            total: permissions.len(),
            status_counts,
            type_counts,
            department_counts,
            permissions: permissions
                .into_iter()
                .map(|p| {
                    let owner = owners.get(&p.user_id).cloned();
                    with_owner(p, owner)
                })
                .collect(),
        })
    }
}

fn count_statuses(permissions: &[Permission]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for p in permissions {
        counts.add(p.status);
    }
    counts
}

// Busca da tela de relatórios: nome do dono, id, tipo, status ou motivo
fn report_matches(permission: &Permission, owner: Option<&User>, term: &str) -> bool {
    owner.is_some_and(|u| u.name.to_lowercase().contains(term))
        || permission.id.to_lowercase().contains(term)
        || permission.kind.as_str().contains(term)
        || permission.status.as_str().contains(term)
        || permission.reason.to_lowercase().contains(term)
}

impl PermissionReport {
    pub fn count_for(&self, status: PermissionStatus) -> usize {
        match status {
            PermissionStatus::Pending => self.status_counts.pending,
            PermissionStatus::Approved => self.status_counts.approved,
            PermissionStatus::Rejected => self.status_counts.rejected,
            PermissionStatus::Completed => self.status_counts.completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::seed,
        models::report::DateRange,
        services::qr_service::QrService,
    };
    use chrono::Duration;

    async fn seeded(now: DateTime<Utc>) -> ReportService {
        let repos = Repositories::memory();
        let qr = QrService::new("https://api.qrserver.com/v1/create-qr-code/", 150);
        seed::install(&repos, &qr, now).await.unwrap();
        ReportService::new(&repos)
    }

    #[tokio::test]
    async fn dashboard_counts_employees_and_statuses() {
        let service = seeded(Utc::now()).await;
        let stats = service.dashboard_stats().await.unwrap();

        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.total_permissions, seed::SEED_PERMISSIONS);
        assert_eq!(
            stats.pending_permissions
                + stats.approved_permissions
                + stats.rejected_permissions
                + stats.completed_permissions,
            seed::SEED_PERMISSIONS
        );
    }

    #[tokio::test]
    async fn user_stats_only_cover_the_caller() {
        let service = seeded(Utc::now()).await;
        let john = service.user_stats("user-2").await.unwrap();
        assert_eq!(john.total_permissions, 17);

        let nobody = service.user_stats("user-4").await.unwrap();
        assert_eq!(nobody, UserStats::default());
    }

    #[tokio::test]
    async fn week_range_excludes_older_requests() {
        let now = Utc::now();
        let service = seeded(now).await;

        let all = service.report(&ReportQuery::default(), now).await.unwrap();
        assert_eq!(all.total, seed::SEED_PERMISSIONS);

        let week = service
            .report(&ReportQuery { search: None, range: DateRange::Week }, now)
            .await
            .unwrap();
        assert!(week.total < all.total);
        assert!(week
            .permissions
            .iter()
            .all(|p| p.permission.created_at >= now - Duration::days(7)));
        assert_eq!(
            week.count_for(PermissionStatus::Pending)
                + week.count_for(PermissionStatus::Approved)
                + week.count_for(PermissionStatus::Rejected)
                + week.count_for(PermissionStatus::Completed),
            week.total
        );
    }

    #[tokio::test]
    async fn search_and_department_breakdown() {
        let now = Utc::now();
        let service = seeded(now).await;

        let report = service
            .report(&ReportQuery { search: Some("Jane".into()), range: DateRange::All }, now)
            .await
            .unwrap();
        assert_eq!(report.total, 33);
        assert_eq!(
            report.department_counts,
            vec![DepartmentCount { department: "Marketing".into(), count: 33 }]
        );

        let by_reason = service
            .report(&ReportQuery { search: Some("reason 50".into()), range: DateRange::All }, now)
            .await
            .unwrap();
        assert_eq!(by_reason.total, 1);
        assert_eq!(by_reason.permissions[0].permission.id, "permission-50");
    }

    #[tokio::test]
    async fn search_matches_status() {
        let now = Utc::now();
        let service = seeded(now).await;
        let stats = service.dashboard_stats().await.unwrap();

        let report = service
            .report(&ReportQuery { search: Some("Approved".into()), range: DateRange::All }, now)
            .await
            .unwrap();
        assert!(report.total > 0);
        assert_eq!(report.total, stats.approved_permissions);
        assert!(report
            .permissions
            .iter()
            .all(|p| p.permission.status == PermissionStatus::Approved));
    }
}
