//! The explicitly owned session state of one client.
//!
//! A [`Gate`] holds the single [`AuthContext`] and everything that observes
//! it. Guards and layout shells are created from it so they share one route
//! table and one fail-open ceiling.

use std::sync::Arc;

use crate::auth::AuthContext;
use crate::config::ConfigV1;
use crate::guard::{LayoutShell, RouteGuard, Routes};
use crate::http::ApiClient;
use crate::models::UserType;

#[derive(Clone)]
pub struct Gate {
    /// Configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// The only writer of the token store and the auth state.
    pub auth: Arc<AuthContext>,
    /// Client for authenticated backend calls; reports 401s to `auth`.
    pub api: ApiClient,
    pub routes: Routes,
}

impl Gate {
    /// A fresh guard for one navigation to `requested_path`.
    pub fn guard(&self, required: Option<UserType>, requested_path: &str) -> RouteGuard {
        RouteGuard::new(
            required,
            requested_path,
            &self.routes,
            self.config.guard.ceiling(),
        )
    }

    pub fn layout(&self, role: UserType) -> LayoutShell {
        LayoutShell::new(role, &self.routes, self.config.guard.ceiling())
    }
}
