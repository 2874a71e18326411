use std::time::Duration;

use super::access::{resolve_access, Access};
use super::routes::Routes;
use crate::auth::AuthState;
use crate::models::UserType;

/// What a role layout should put on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellView {
    Loading,
    Chrome(ShellChrome),
    Redirect(String),
}

/// Header and navigation data for a role layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellChrome {
    pub role: UserType,
    /// `None` when rendered fail-open with no session yet.
    pub display_name: Option<String>,
    pub home: String,
}

/// Role-specific chrome around already guarded pages. Makes its one redirect
/// check through the same `resolve_access` and ceiling as the route guard.
#[derive(Debug, Clone)]
pub struct LayoutShell {
    role: UserType,
    routes: Routes,
    ceiling: Duration,
}

impl LayoutShell {
    pub fn new(role: UserType, routes: &Routes, ceiling: Duration) -> Self {
        LayoutShell {
            role,
            routes: routes.clone(),
            ceiling,
        }
    }

    pub fn role(&self) -> UserType {
        self.role
    }

    pub fn view(&self, auth: &AuthState, requested_path: &str, elapsed: Duration) -> ShellView {
        match resolve_access(auth, Some(self.role), elapsed, self.ceiling) {
            Access::Pending => ShellView::Loading,
            Access::Allowed => ShellView::Chrome(ShellChrome {
                role: self.role,
                display_name: auth.user().map(|user| user.display_name()),
                home: self.routes.home_for(self.role).to_string(),
            }),
            Access::Denied(denial) => ShellView::Redirect(self.routes.redirect_for(
                denial,
                Some(self.role),
                requested_path,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutesConfig;
    use crate::models::{Session, User};

    const CEILING: Duration = Duration::from_secs(5);

    fn shell(role: UserType) -> LayoutShell {
        LayoutShell::new(role, &Routes::new(&RoutesConfig::default()), CEILING)
    }

    #[test]
    fn renders_chrome_for_matching_session() {
        let state = AuthState::authenticated(Session::new(
            "t1",
            User::new("7", "Ada", "Lovelace", "ada@x.com", UserType::Company),
        ));
        match shell(UserType::Company).view(&state, "/company/jobs", Duration::ZERO) {
            ShellView::Chrome(chrome) => {
                assert_eq!(chrome.role, UserType::Company);
                assert_eq!(chrome.display_name.as_deref(), Some("Ada Lovelace"));
                assert_eq!(chrome.home, "/company/dashboard");
            }
            other => panic!("unexpected view {:?}", other),
        }
    }

    #[test]
    fn same_ceiling_as_the_guard() {
        let shell = shell(UserType::Freelancer);
        let state = AuthState::bootstrapping();
        assert_eq!(
            shell.view(&state, "/talent/jobs", Duration::from_millis(4999)),
            ShellView::Loading
        );
        assert!(matches!(
            shell.view(&state, "/talent/jobs", CEILING),
            ShellView::Chrome(ShellChrome {
                display_name: None,
                ..
            })
        ));
    }

    #[test]
    fn anonymous_is_sent_to_login() {
        assert_eq!(
            shell(UserType::Admin).view(&AuthState::anonymous(), "/admin/users", Duration::ZERO),
            ShellView::Redirect("/admin/login?returnTo=%2Fadmin%2Fusers".to_string())
        );
    }
}
