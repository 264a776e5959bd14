// src/models/permission.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::{common::error::AppError, models::auth::User};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "permission_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PermissionType {
    Sick,
    Vacation,
    Personal,
    Other,
}

impl PermissionType {
    pub const ALL: [PermissionType; 4] = [
        PermissionType::Sick,
        PermissionType::Vacation,
        PermissionType::Personal,
        PermissionType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionType::Sick => "sick",
            PermissionType::Vacation => "vacation",
            PermissionType::Personal => "personal",
            PermissionType::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PermissionType::Sick => "Sick Leave",
            PermissionType::Vacation => "Vacation",
            PermissionType::Personal => "Personal Leave",
            PermissionType::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "permission_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl PermissionStatus {
    pub const ALL: [PermissionStatus; 4] = [
        PermissionStatus::Pending,
        PermissionStatus::Approved,
        PermissionStatus::Rejected,
        PermissionStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionStatus::Pending => "pending",
            PermissionStatus::Approved => "approved",
            PermissionStatus::Rejected => "rejected",
            PermissionStatus::Completed => "completed",
        }
    }

    /// Tabela de transições. `None` = transição proibida.
    pub fn next(self, action: PermissionAction) -> Option<PermissionStatus> {
        use PermissionAction::*;
        use PermissionStatus::*;

        match (self, action) {
            (Pending, Approve) => Some(Approved),
            (Pending, Reject) => Some(Rejected),
            (Approved, CheckIn) => Some(Approved),
            (Approved, CheckOut) => Some(Completed),
            _ => None,
        }
    }

    /// Só permissões aprovadas ou concluídas passam pela portaria.
    pub fn is_scannable(self) -> bool {
        matches!(self, PermissionStatus::Approved | PermissionStatus::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    Approve,
    Reject,
    CheckIn,
    CheckOut,
}

impl PermissionAction {
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionAction::Approve => "approve",
            PermissionAction::Reject => "reject",
            PermissionAction::CheckIn => "check in",
            PermissionAction::CheckOut => "check out",
        }
    }
}

// --- Structs ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[schema(example = "permission-7")]
    pub id: String,
    #[schema(example = "user-2")]
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: PermissionType,
    #[schema(example = "Consulta médica")]
    pub reason: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: PermissionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_in_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_out_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "https://api.qrserver.com/v1/create-qr-code/?size=150x150&data=permission-7")]
    pub qr_code: Option<String>,
}

// Permissão com o dono embutido (tabelas do admin e relatórios)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionWithUser {
    #[serde(flatten)]
    pub permission: Permission,
    pub user: Option<User>,
    #[schema(example = "5 hours")]
    pub duration: String,
}

// Payload do formulário do funcionário
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePermissionPayload {
    #[serde(rename = "type")]
    pub kind: PermissionType,

    #[validate(length(min = 5, message = "validation.reason_min"))]
    #[schema(example = "Consulta médica")]
    pub reason: String,

    #[serde(with = "flexible_datetime")]
    #[schema(value_type = String, example = "2024-01-01T09:00")]
    pub start_time: DateTime<Utc>,

    #[serde(with = "flexible_datetime")]
    #[schema(value_type = String, example = "2024-01-01T17:00")]
    pub end_time: DateTime<Utc>,
}

impl CreatePermissionPayload {
    /// Regras do formulário + a janela de tempo (erro no campo `endTime`).
    pub fn check(&self) -> Result<(), AppError> {
        let mut errors = match self.validate() {
            Ok(()) => validator::ValidationErrors::new(),
            Err(errors) => errors,
        };

        if self.end_time <= self.start_time {
            let mut error = validator::ValidationError::new("time_window");
            error.message = Some("validation.end_after_start".into());
            errors.add("endTime", error);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationError(errors))
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct PermissionListQuery {
    pub search: Option<String>,
    pub status: Option<PermissionStatus>,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_recent_count")]
    pub count: usize,
}

fn default_recent_count() -> usize {
    5
}

// --- Ciclo de vida ---

impl Permission {
    /// Nova solicitação do funcionário, sempre pendente.
    pub fn new_request(
        id: String,
        owner_id: &str,
        payload: &CreatePermissionPayload,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        payload.check()?;

        Ok(Self {
            id,
            user_id: owner_id.to_string(),
            kind: payload.kind,
            reason: payload.reason.trim().to_string(),
            start_time: payload.start_time,
            end_time: payload.end_time,
            status: PermissionStatus::Pending,
            created_at: now,
            approved_at: None,
            approved_by: None,
            check_in_time: None,
            check_out_time: None,
            qr_code: None,
        })
    }

    // Guardas de check-in/out antes da tabela de status
    fn transition(&self, action: PermissionAction) -> Result<PermissionStatus, AppError> {
        match action {
            PermissionAction::CheckIn if self.check_in_time.is_some() => {
                return Err(AppError::AlreadyCheckedIn);
            }
            PermissionAction::CheckOut if self.check_out_time.is_some() => {
                return Err(AppError::AlreadyCheckedOut);
            }
            PermissionAction::CheckOut if self.check_in_time.is_none() => {
                return Err(AppError::NotCheckedIn);
            }
            _ => {}
        }

        self.status.next(action).ok_or(AppError::InvalidTransition {
            action,
            from: self.status,
        })
    }

    pub fn approve(&mut self, approver_id: &str, qr_code: String, now: DateTime<Utc>) -> Result<(), AppError> {
        self.status = self.transition(PermissionAction::Approve)?;
        self.approved_at = Some(now);
        self.approved_by = Some(approver_id.to_string());
        self.qr_code = Some(qr_code);
        Ok(())
    }

    /// `approved_at` guarda o momento da decisão também na rejeição.
    pub fn reject(&mut self, now: DateTime<Utc>) -> Result<(), AppError> {
        self.status = self.transition(PermissionAction::Reject)?;
        self.approved_at = Some(now);
        Ok(())
    }

    pub fn check_in(&mut self, now: DateTime<Utc>) -> Result<(), AppError> {
        self.status = self.transition(PermissionAction::CheckIn)?;
        self.check_in_time = Some(now);
        Ok(())
    }

    pub fn check_out(&mut self, now: DateTime<Utc>) -> Result<(), AppError> {
        self.status = self.transition(PermissionAction::CheckOut)?;
        self.check_out_time = Some(now);
        Ok(())
    }

    /// Busca do painel: nome do dono, id, tipo ou status.
    pub fn matches(&self, owner: Option<&User>, term: &str) -> bool {
        let term = term.to_lowercase();
        owner.is_some_and(|u| u.name.to_lowercase().contains(&term))
            || self.id.to_lowercase().contains(&term)
            || self.kind.as_str().contains(&term)
            || self.status.as_str().contains(&term)
    }

    pub fn duration(&self) -> String {
        format_duration(self.start_time, self.end_time)
    }
}

/// "N hours" abaixo de um dia, senão "N days" (arredondado).
pub fn format_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let hours = (end - start).num_milliseconds().abs() as f64 / 3_600_000.0;
    if hours < 24.0 {
        format!("{} hours", hours.round() as i64)
    } else {
        format!("{} days", (hours / 24.0).round() as i64)
    }
}

// O formulário do front manda "2024-01-01T09:00" (sem fuso); aceitamos isso como UTC e RFC 3339.
pub mod flexible_datetime {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    const LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        LOCAL_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("data/hora inválida: {}", raw)))
    }
}
