// src/services/navigation.rs

use crate::models::{access::GateDecision, auth::Role};

pub const LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Clone, Copy)]
pub enum RouteAccess {
    Public,
    Roles(&'static [Role]),
    // Rotas antigas que apenas redirecionam
    Alias(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct RouteRule {
    pub path: &'static str,
    pub access: RouteAccess,
}

const fn route(path: &'static str, access: RouteAccess) -> RouteRule {
    RouteRule { path, access }
}

pub const ROUTES: &[RouteRule] = &[
    route("/", RouteAccess::Public),
    route(LOGIN_ROUTE, RouteAccess::Public),
    route("/admin/dashboard", RouteAccess::Roles(&[Role::Admin])),
    route("/admin/permissions", RouteAccess::Roles(&[Role::Admin])),
    route("/admin/reports", RouteAccess::Roles(&[Role::Admin])),
    route("/admin/users", RouteAccess::Roles(&[Role::Admin])),
    route("/employee/dashboard", RouteAccess::Roles(&[Role::Employee])),
    route("/security/scan", RouteAccess::Roles(&[Role::Security])),
    route("/admin", RouteAccess::Alias("/admin/dashboard")),
    route("/employee", RouteAccess::Alias("/employee/dashboard")),
    route("/security", RouteAccess::Alias("/security/scan")),
];

/// Decisão pura do portão de acesso para uma rota protegida.
pub fn gate(role: Option<Role>, allowed: &[Role], path: &str) -> GateDecision {
    match role {
        None => GateDecision::Redirect { to: LOGIN_ROUTE.to_string() },
        Some(role) if allowed.contains(&role) => GateDecision::Render { path: path.to_string() },
        Some(role) => GateDecision::Redirect { to: role.home_route().to_string() },
    }
}

pub fn resolve(path: &str, role: Option<Role>) -> GateDecision {
    let path = match path.trim() {
        "" => "/",
        "/" => "/",
        p => p.trim_end_matches('/'),
    };

    match ROUTES.iter().find(|r| r.path == path).map(|r| r.access) {
        None => GateDecision::NotFound,
        Some(RouteAccess::Public) => GateDecision::Render { path: path.to_string() },
        Some(RouteAccess::Alias(target)) => GateDecision::Redirect { to: target.to_string() },
        Some(RouteAccess::Roles(allowed)) => gate(role, allowed, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(path: &str) -> GateDecision {
        GateDecision::Render { path: path.into() }
    }

    fn redirect(to: &str) -> GateDecision {
        GateDecision::Redirect { to: to.into() }
    }

    #[test]
    fn anonymous_users_go_to_login() {
        assert_eq!(resolve("/admin/users", None), redirect("/login"));
        assert_eq!(resolve("/security/scan", None), redirect("/login"));
        assert_eq!(resolve("/login", None), render("/login"));
        assert_eq!(resolve("/", None), render("/"));
    }

    #[test]
    fn wrong_role_goes_home() {
        assert_eq!(resolve("/admin/reports", Some(Role::Employee)), redirect("/employee/dashboard"));
        assert_eq!(resolve("/employee/dashboard", Some(Role::Security)), redirect("/security/scan"));
        assert_eq!(resolve("/security/scan", Some(Role::Admin)), redirect("/admin/dashboard"));
    }

    #[test]
    fn allowed_role_renders() {
        assert_eq!(resolve("/admin/permissions/", Some(Role::Admin)), render("/admin/permissions"));
        assert_eq!(resolve("/security/scan", Some(Role::Security)), render("/security/scan"));
    }

    #[test]
    fn aliases_and_unknown_routes() {
        assert_eq!(resolve("/admin", Some(Role::Admin)), redirect("/admin/dashboard"));
        assert_eq!(resolve("/security", None), redirect("/security/scan"));
        assert_eq!(resolve("/nowhere", Some(Role::Admin)), GateDecision::NotFound);
    }

    #[test]
    fn every_home_route_is_reachable_by_its_role() {
        for role in [Role::Admin, Role::Employee, Role::Security] {
            assert_eq!(resolve(role.home_route(), Some(role)), render(role.home_route()));
        }
    }
}
