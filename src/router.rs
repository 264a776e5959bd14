// src/router.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    // Sessão atual (protegidas pelo middleware)
    let session_routes = Router::new()
        .route("/logout", post(handlers::auth::logout))
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let user_routes = Router::new()
        .route(
            "/",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let department_routes = Router::new()
        .route("/", get(handlers::users::list_departments))
        .route("/{id}", get(handlers::users::get_department))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let permission_routes = Router::new()
        .route(
            "/",
            post(handlers::permissions::create_permission).get(handlers::permissions::list_permissions),
        )
        .route("/mine", get(handlers::permissions::list_my_permissions))
        .route("/recent", get(handlers::permissions::recent_permissions))
        .route("/{id}", get(handlers::permissions::get_permission))
        .route("/{id}/approve", post(handlers::permissions::approve_permission))
        .route("/{id}/reject", post(handlers::permissions::reject_permission))
        .route("/{id}/check-in", post(handlers::permissions::check_in_permission))
        .route("/{id}/check-out", post(handlers::permissions::check_out_permission))
        .route("/{id}/qr.png", get(handlers::permissions::permission_qr))
        .route("/{id}/pass.pdf", get(handlers::permissions::permission_pass))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let scanner_routes = Router::new()
        .route("/", get(handlers::scanner::get_state))
        .route("/start", post(handlers::scanner::start))
        .route("/camera", post(handlers::scanner::camera))
        .route("/decode", post(handlers::scanner::decode))
        .route("/confirm", post(handlers::scanner::confirm))
        .route("/cancel", post(handlers::scanner::cancel))
        .route("/retry", post(handlers::scanner::retry))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let report_routes = Router::new()
        .route("/", get(handlers::reports::report))
        .route("/dashboard", get(handlers::reports::dashboard))
        .route("/me", get(handlers::reports::my_stats))
        .route("/export.pdf", get(handlers::reports::export_pdf))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(handlers::navigation::health))
        .route("/api/navigation/resolve", get(handlers::navigation::resolve))
        .nest("/api/auth", auth_routes.merge(session_routes))
        .nest("/api/users", user_routes)
        .nest("/api/departments", department_routes)
        .nest("/api/permissions", permission_routes)
        .nest("/api/scanner", scanner_routes)
        .nest("/api/reports", report_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, db::Repositories};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app() -> Router {
        let state = AppState::with_repositories(Config::for_tests(), Repositories::memory(), None)
            .await
            .unwrap();
        build_router(state)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn login(app: &Router, email: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": "demo" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_memory_storage() {
        let app = app().await;
        let (status, body) = send(&app, "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["storage"], "memory");
    }

    #[tokio::test]
    async fn login_returns_home_route_and_session_works() {
        let app = app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "security@example.com", "password": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["homeRoute"], "/security/scan");
        assert_eq!(body["user"]["role"], "security");

        let token = body["token"].as_str().unwrap();
        let (status, me) = send(&app, "GET", "/api/auth/me", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], "user-4");

        let (status, _) = send(&app, "POST", "/api/auth/logout", Some(token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", "/api/auth/me", Some(token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bad_credentials_and_missing_token_are_401() {
        let app = app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ghost@example.com", "password": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid email or password");

        let (status, _) = send(&app, "GET", "/api/permissions", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn inverted_window_is_a_field_error() {
        let app = app().await;
        let token = login(&app, "john@example.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/permissions",
            Some(&token),
            Some(json!({
                "type": "sick",
                "reason": "Consulta médica",
                "startTime": "2024-01-01T09:00",
                "endTime": "2024-01-01T08:00"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"]["endTime"].is_array());
    }

    #[tokio::test]
    async fn employee_creates_and_lists_own_request() {
        let app = app().await;
        let token = login(&app, "john@example.com").await;

        let (status, created) = send(
            &app,
            "POST",
            "/api/permissions",
            Some(&token),
            Some(json!({
                "type": "personal",
                "reason": "Banco no centro",
                "startTime": "2024-01-01T09:00",
                "endTime": "2024-01-01T11:00"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["status"], "pending");
        assert_eq!(created["userId"], "user-2");

        let (status, mine) = send(&app, "GET", "/api/permissions/mine", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let mine = mine.as_array().unwrap();
        assert!(mine.iter().all(|p| p["userId"] == "user-2"));
        assert!(mine.iter().any(|p| p["id"] == created["id"]));
    }

    #[tokio::test]
    async fn only_admin_decides_and_decisions_are_final() {
        let app = app().await;
        let employee = login(&app, "jane@example.com").await;
        let admin = login(&app, "admin@example.com").await;

        let (status, body) =
            send(&app, "POST", "/api/permissions/permission-7/approve", Some(&employee), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body["error"].as_str().unwrap().contains("permissions:decide"));

        let (status, approved) =
            send(&app, "POST", "/api/permissions/permission-7/approve", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approved["status"], "approved");
        assert!(approved["qrCode"].as_str().unwrap().contains("permission-7"));

        let (status, _) =
            send(&app, "POST", "/api/permissions/permission-7/reject", Some(&admin), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn guard_scans_in_and_out() {
        let app = app().await;
        let admin = login(&app, "admin@example.com").await;
        let guard = login(&app, "security@example.com").await;
        send(&app, "POST", "/api/permissions/permission-7/approve", Some(&admin), None).await;

        for round in ["check_in", "check_out"] {
            let (_, state) = send(&app, "POST", "/api/scanner/start", Some(&guard), None).await;
            assert_eq!(state["state"], "requesting_permission");
            let (_, state) = send(
                &app,
                "POST",
                "/api/scanner/camera",
                Some(&guard),
                Some(json!({ "granted": true })),
            )
            .await;
            assert_eq!(state["state"], "scanning");

            let (status, state) = send(
                &app,
                "POST",
                "/api/scanner/decode",
                Some(&guard),
                Some(json!({ "text": "permission-7" })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(state["state"], "result_found");
            assert_eq!(state["isCheckIn"], round == "check_in");

            let (status, done) = send(&app, "POST", "/api/scanner/confirm", Some(&guard), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(done["action"], round);
        }

        let (_, permission) = send(&app, "GET", "/api/permissions/permission-7", Some(&admin), None).await;
        assert_eq!(permission["status"], "completed");
    }

    #[tokio::test]
    async fn unknown_qr_is_unprocessable() {
        let app = app().await;
        let guard = login(&app, "security@example.com").await;
        send(&app, "POST", "/api/scanner/start", Some(&guard), None).await;
        send(&app, "POST", "/api/scanner/camera", Some(&guard), Some(json!({ "granted": true }))).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/scanner/decode",
            Some(&guard),
            Some(json!({ "text": "permission-404" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "Invalid QR Code");

        let (_, state) = send(&app, "GET", "/api/scanner", Some(&guard), None).await;
        assert_eq!(state["state"], "idle");
    }

    #[tokio::test]
    async fn navigation_gate_depends_on_caller() {
        let app = app().await;
        let (_, anonymous) = send(&app, "GET", "/api/navigation/resolve?path=/admin/users", None, None).await;
        assert_eq!(anonymous, json!({ "decision": "redirect", "to": "/login" }));

        let employee = login(&app, "john@example.com").await;
        let (_, decision) = send(
            &app,
            "GET",
            "/api/navigation/resolve?path=/admin/users",
            Some(&employee),
            None,
        )
        .await;
        assert_eq!(decision, json!({ "decision": "redirect", "to": "/employee/dashboard" }));

        let (_, missing) = send(&app, "GET", "/api/navigation/resolve?path=/nope", None, None).await;
        assert_eq!(missing["decision"], "not_found");
    }

    #[tokio::test]
    async fn admin_dashboard_counts_employees() {
        let app = app().await;
        let admin = login(&app, "admin@example.com").await;
        let (status, stats) = send(&app, "GET", "/api/reports/dashboard", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["totalUsers"], 2);
        assert_eq!(stats["totalPermissions"], 50);
    }

    #[tokio::test]
    async fn errors_follow_accept_language() {
        let app = app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT_LANGUAGE, "id-ID,id;q=0.9")
            .body(Body::from(json!({ "email": "ghost@example.com", "password": "x" }).to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_ne!(body["error"], "Invalid email or password");
    }
}
