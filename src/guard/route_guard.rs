//! Per-navigation gate in front of a protected view.
//!
//! A guard starts `Pending` and ends in `Allowed` or `Denied`; it never goes
//! back. It only reads the auth state, so dropping a guard mid-wait (the user
//! navigated away) leaves nothing behind.

use std::sync::OnceLock;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::access::{is_fail_open, resolve_access, Access};
use super::routes::Routes;
use crate::auth::AuthState;
use crate::models::UserType;
use crate::utils::log_throttle::LogThrottle;

const GUARD_TIMEOUT_LOG_WINDOW: Duration = Duration::from_secs(30);

fn guard_timeout_logs() -> &'static LogThrottle {
    static THROTTLE: OnceLock<LogThrottle> = OnceLock::new();
    THROTTLE.get_or_init(|| LogThrottle::new(GUARD_TIMEOUT_LOG_WINDOW))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Pending,
    /// Render the protected view.
    Allowed,
    /// Do not render; navigate to `redirect` instead.
    Denied { redirect: String },
}

impl GuardState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GuardState::Pending)
    }
}

pub struct RouteGuard {
    id: Uuid,
    required: Option<UserType>,
    requested_path: String,
    routes: Routes,
    ceiling: Duration,
    mounted_at: Instant,
    state: GuardState,
}

impl RouteGuard {
    /// Mounts a guard for `requested_path`. `ceiling` is the fail-open bound,
    /// the same one layout shells use.
    pub fn new(
        required: Option<UserType>,
        requested_path: impl Into<String>,
        routes: &Routes,
        ceiling: Duration,
    ) -> Self {
        let requested_path = requested_path.into();
        let id = Uuid::new_v4();
        debug!(
            "Mounting route guard {} for '{}' (requires {:?})",
            id, requested_path, required
        );
        RouteGuard {
            id,
            required,
            requested_path,
            routes: routes.clone(),
            ceiling,
            mounted_at: Instant::now(),
            state: GuardState::Pending,
        }
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    pub fn requested_path(&self) -> &str {
        &self.requested_path
    }

    /// Re-evaluates against `auth` using the time since mount.
    pub fn evaluate(&mut self, auth: &AuthState) -> &GuardState {
        let elapsed = self.mounted_at.elapsed();
        self.evaluate_at(auth, elapsed)
    }

    /// Re-evaluates as if `elapsed` had passed since mount. A terminal state
    /// is kept as is.
    pub fn evaluate_at(&mut self, auth: &AuthState, elapsed: Duration) -> &GuardState {
        if self.state.is_terminal() {
            return &self.state;
        }

        if self.routes.is_login_page(&self.requested_path) {
            self.state = GuardState::Allowed;
            return &self.state;
        }

        self.state = match resolve_access(auth, self.required, elapsed, self.ceiling) {
            Access::Pending => GuardState::Pending,
            Access::Allowed => {
                if is_fail_open(auth, elapsed, self.ceiling) {
                    self.log_timeout();
                } else {
                    debug!("Route guard {} allowed '{}'", self.id, self.requested_path);
                }
                GuardState::Allowed
            }
            Access::Denied(denial) => {
                let redirect =
                    self.routes
                        .redirect_for(denial, self.required, &self.requested_path);
                info!(
                    "Route guard {} denied '{}' ({:?}); redirecting to '{}'",
                    self.id, self.requested_path, denial, redirect
                );
                GuardState::Denied { redirect }
            }
        };
        &self.state
    }

    fn log_timeout(&self) {
        if let Some(suppressed_count) = guard_timeout_logs().should_emit(&self.requested_path) {
            warn!(
                guard_id = %self.id,
                path = self.requested_path.as_str(),
                ceiling_ms = self.ceiling.as_millis() as u64,
                suppressed_count,
                "Auth state still loading at the guard ceiling; rendering anyway"
            );
        }
    }

    /// Waits for the auth state to settle (or the ceiling to pass) and
    /// returns the terminal state.
    pub async fn resolve(mut self, mut auth: watch::Receiver<AuthState>) -> GuardState {
        loop {
            let current = auth.borrow_and_update().clone();
            if self.evaluate(&current).is_terminal() {
                return self.state;
            }

            let remaining = self.ceiling.saturating_sub(self.mounted_at.elapsed());
            match timeout(remaining, auth.changed()).await {
                Ok(Ok(())) => continue,
                // Ceiling reached; the next evaluation fails open.
                Err(_) => continue,
                Ok(Err(_)) => {
                    warn!(
                        "Route guard {}: auth context went away while waiting",
                        self.id
                    );
                    let last = auth.borrow().clone();
                    let elapsed = self.ceiling.max(self.mounted_at.elapsed());
                    self.evaluate_at(&last, elapsed);
                    return self.state;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutesConfig;
    use crate::models::{Session, User};

    const CEILING: Duration = Duration::from_secs(5);

    fn routes() -> Routes {
        Routes::new(&RoutesConfig::default())
    }

    fn signed_in(user_type: UserType) -> AuthState {
        AuthState::authenticated(Session::new(
            "t1",
            User::new("1", "A", "B", "a@x.com", user_type),
        ))
    }

    #[test]
    fn terminal_state_is_sticky() {
        let mut guard = RouteGuard::new(Some(UserType::Company), "/company/jobs", &routes(), CEILING);
        guard.evaluate_at(&AuthState::anonymous(), Duration::ZERO);
        assert_eq!(
            guard.state(),
            &GuardState::Denied {
                redirect: "/login?returnTo=%2Fcompany%2Fjobs".to_string()
            }
        );

        guard.evaluate_at(&signed_in(UserType::Company), Duration::ZERO);
        assert!(matches!(guard.state(), GuardState::Denied { .. }));
    }

    #[test]
    fn login_page_is_never_redirected() {
        let mut guard = RouteGuard::new(Some(UserType::Admin), "/admin/login", &routes(), CEILING);
        assert_eq!(
            guard.evaluate_at(&AuthState::anonymous(), Duration::ZERO),
            &GuardState::Allowed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_bootstrap_then_denies_wrong_user_type() {
        let (tx, rx) = watch::channel(AuthState::bootstrapping());
        let guard = RouteGuard::new(Some(UserType::Admin), "/admin/dashboard", &routes(), CEILING);
        let handle = tokio::spawn(guard.resolve(rx));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!handle.is_finished());

        tx.send_replace(signed_in(UserType::Company));
        let outcome = handle.await.unwrap();
        assert_eq!(
            outcome,
            GuardState::Denied {
                redirect: "/company/dashboard".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn fails_open_at_the_ceiling() {
        let (_tx, rx) = watch::channel(AuthState::bootstrapping());
        let guard = RouteGuard::new(None, "/talent/jobs", &routes(), CEILING);
        let started = Instant::now();

        let outcome = guard.resolve(rx).await;
        assert_eq!(outcome, GuardState::Allowed);
        assert!(started.elapsed() >= CEILING);
    }

    #[tokio::test(start_paused = true)]
    async fn already_loaded_state_resolves_immediately() {
        let (_tx, rx) = watch::channel(signed_in(UserType::Freelancer));
        let guard = RouteGuard::new(Some(UserType::Freelancer), "/talent/jobs", &routes(), CEILING);
        assert_eq!(guard.resolve(rx).await, GuardState::Allowed);
    }
}
