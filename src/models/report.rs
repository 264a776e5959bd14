// src/models/report.rs

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::permission::{PermissionStatus, PermissionType, PermissionWithUser};

// 1. Cards do painel do admin
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: usize, // Só funcionários
    pub total_permissions: usize,
    pub pending_permissions: usize,
    pub approved_permissions: usize,
    pub rejected_permissions: usize,
    pub completed_permissions: usize,
}

// 2. Cards do painel do funcionário
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_permissions: usize,
    pub pending_permissions: usize,
    pub approved_permissions: usize,
    pub rejected_permissions: usize,
    pub completed_permissions: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    #[default]
    All,
    Week,
    Month,
    Year,
}

impl DateRange {
    /// Limite inferior de `createdAt` para o período.
    pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            DateRange::All => None,
            DateRange::Week => Some(now - chrono::Duration::days(7)),
            DateRange::Month => now.checked_sub_months(Months::new(1)),
            DateRange::Year => now.checked_sub_months(Months::new(12)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub range: DateRange,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub completed: usize,
}

impl StatusCounts {
    pub fn add(&mut self, status: PermissionStatus) {
        match status {
            PermissionStatus::Pending => self.pending += 1,
            PermissionStatus::Approved => self.approved += 1,
            PermissionStatus::Rejected => self.rejected += 1,
            PermissionStatus::Completed => self.completed += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypeCounts {
    pub sick: usize,
    pub vacation: usize,
    pub personal: usize,
    pub other: usize,
}

impl TypeCounts {
    pub fn add(&mut self, kind: PermissionType) {
        match kind {
            PermissionType::Sick => self.sick += 1,
            PermissionType::Vacation => self.vacation += 1,
            PermissionType::Personal => self.personal += 1,
            PermissionType::Other => self.other += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCount {
    #[schema(example = "Engineering")]
    pub department: String,
    pub count: usize,
}

// 3. Relatório filtrado (tela de relatórios)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionReport {
    pub range: DateRange,
    pub total: usize,
    pub status_counts: StatusCounts,
    pub type_counts: TypeCounts,
    pub department_counts: Vec<DepartmentCount>,
    pub permissions: Vec<PermissionWithUser>,
}
