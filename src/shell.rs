//! Catch-all application shell for the single-page admin front end.
//!
//! The server does not render views. It knows the admin route table so that
//! it can tell the client which view a deep link resolves to, and otherwise
//! hands every unmatched `GET` back to the front end.

use axum::{
    extract::State,
    http::{header, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::state::AppState;

pub const VIEW_HEADER: HeaderName = HeaderName::from_static("x-admin-view");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRoute {
    pub path: &'static str,
    pub name: &'static str,
    pub component: &'static str,
}

#[derive(Debug, Clone)]
pub struct ViewTable {
    routes: Vec<ViewRoute>,
}

impl ViewTable {
    pub fn new(routes: Vec<ViewRoute>) -> Self {
        Self { routes }
    }

    /// The admin panel views.
    pub fn admin() -> Self {
        Self::new(vec![
            ViewRoute {
                path: "/admin/dashboard",
                name: "admin.dashboard",
                component: "Dashboard",
            },
            ViewRoute {
                path: "/admin/appointments",
                name: "admin.appointments",
                component: "appointments/ListAppointments",
            },
            ViewRoute {
                path: "/admin/users",
                name: "admin.users",
                component: "users/ListUsers",
            },
            ViewRoute {
                path: "/admin/settings",
                name: "admin.settings",
                component: "settings/UpdateSetting",
            },
            ViewRoute {
                path: "/admin/profile",
                name: "admin.profile",
                component: "profile/UpdateProfile",
            },
        ])
    }

    pub fn routes(&self) -> &[ViewRoute] {
        &self.routes
    }

    pub fn resolve(&self, path: &str) -> Option<&ViewRoute> {
        let trimmed = path.trim_end_matches('/');
        let path = if trimmed.is_empty() { "/" } else { trimmed };
        self.routes.iter().find(|r| r.path == path)
    }
}

fn builtin_shell(view: Option<&ViewRoute>) -> String {
    let view_name = view.map(|v| v.name).unwrap_or("");
    let component = view.map(|v| v.component).unwrap_or("");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta name="admin-view" content="{view_name}">
<meta name="admin-component" content="{component}">
<title>Admin</title>
<link rel="stylesheet" href="/assets/app.css">
</head>
<body>
<div id="app"></div>
<script type="module" src="/assets/app.js"></script>
</body>
</html>
"#
    )
}

pub async fn application_shell(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::NOT_FOUND.into_response();
    }

    let view = state.views.resolve(uri.path());
    debug!(path = %uri.path(), view = view.map(|v| v.name), "serving application shell");

    let body = match &state.config.shell.index_file {
        Some(index) => match tokio::fs::read_to_string(index).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, path = %index.display(), "shell index unreadable; using built-in shell");
                builtin_shell(view)
            }
        },
        None => builtin_shell(view),
    };

    let mut response = Html(body).into_response();
    if let Some(view) = view {
        response
            .headers_mut()
            .insert(VIEW_HEADER, HeaderValue::from_static(view.name));
    }
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}
