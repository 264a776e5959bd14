// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::get_me,

        // --- Navigation ---
        handlers::navigation::resolve,
        handlers::navigation::health,

        // --- Users / Departments ---
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::users::list_departments,
        handlers::users::get_department,

        // --- Permissions ---
        handlers::permissions::create_permission,
        handlers::permissions::list_my_permissions,
        handlers::permissions::list_permissions,
        handlers::permissions::recent_permissions,
        handlers::permissions::get_permission,
        handlers::permissions::approve_permission,
        handlers::permissions::reject_permission,
        handlers::permissions::check_in_permission,
        handlers::permissions::check_out_permission,
        handlers::permissions::permission_qr,
        handlers::permissions::permission_pass,

        // --- Scanner ---
        handlers::scanner::get_state,
        handlers::scanner::start,
        handlers::scanner::camera,
        handlers::scanner::decode,
        handlers::scanner::confirm,
        handlers::scanner::cancel,
        handlers::scanner::retry,

        // --- Reports ---
        handlers::reports::dashboard,
        handlers::reports::my_stats,
        handlers::reports::report,
        handlers::reports::export_pdf,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::UserPayload,
            models::department::Department,
            models::access::Capability,

            // --- Permissions ---
            models::permission::PermissionType,
            models::permission::PermissionStatus,
            models::permission::PermissionAction,
            models::permission::Permission,
            models::permission::PermissionWithUser,
            models::permission::CreatePermissionPayload,

            // --- Scanner ---
            models::scan::ScanAction,
            models::scan::CameraResultPayload,
            models::scan::DecodePayload,
            models::scan::ScanConfirmation,

            // --- Reports ---
            models::report::DashboardStats,
            models::report::UserStats,
            models::report::DateRange,
            models::report::StatusCounts,
            models::report::TypeCounts,
            models::report::DepartmentCount,
            models::report::PermissionReport,
        )
    ),
    tags(
        (name = "Auth", description = "Login, logout e sessão"),
        (name = "Navigation", description = "Portão de acesso das rotas do front end"),
        (name = "Health", description = "Estado do serviço"),
        (name = "Users", description = "Gestão de usuários (admin)"),
        (name = "Departments", description = "Tabela de departamentos"),
        (name = "Permissions", description = "Ciclo de vida das permissões de saída"),
        (name = "Scanner", description = "Leitura de QR na portaria"),
        (name = "Reports", description = "Indicadores e relatórios")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
