//! The single authority over the session.
//!
//! [`AuthContext`] owns both the token store and the published [`AuthState`].
//! Every other component observes the state through a `watch` receiver and
//! never writes to either. Store writes always happen before the matching
//! state transition is published, so an observer never sees `Authenticated`
//! ahead of a durable token, nor `Anonymous` while a token is still stored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::error::AuthError;
use super::state::{AuthState, AuthStatus};
use crate::http::Backend;
use crate::models::user::token_preview;
use crate::models::{LoginRole, Registration, Session, User};
use crate::resolvers::ResolverChain;
use crate::store::TokenStore;

pub struct AuthContext {
    store: Arc<dyn TokenStore>,
    backend: Arc<Backend>,
    resolvers: ResolverChain,
    state: watch::Sender<AuthState>,
    bootstrapped: AtomicBool,
    login_in_flight: AtomicBool,
    /// Bumped by every logout. A login only commits its token if no logout
    /// happened since it started; the lock also orders the two store writes.
    generation: Mutex<u64>,
}

/// Clears `loading` if the operation holding it is dropped before it could
/// publish its own outcome. Plays the part of a `finally` block.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<AuthState>,
    /// Set during bootstrap: the token it was reconciling is discarded too.
    store: Option<&'a dyn TokenStore>,
    armed: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(state: &'a watch::Sender<AuthState>) -> Self {
        LoadingGuard {
            state,
            store: None,
            armed: true,
        }
    }

    fn bootstrap(state: &'a watch::Sender<AuthState>, store: &'a dyn TokenStore) -> Self {
        LoadingGuard {
            state,
            store: Some(store),
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        warn!("Auth operation abandoned before completion; releasing loading state.");
        if let Some(store) = self.store {
            if let Err(e) = store.clear() {
                error!("Failed to clear token store '{}': {}", store.name(), e);
            }
        }
        self.state.send_modify(|state| {
            state.loading = false;
            if state.is_bootstrapping() {
                state.status = AuthStatus::Anonymous;
            }
        });
    }
}

/// Releases the single login slot when the login ends, however it ends.
struct LoginSlot<'a>(&'a AtomicBool);

impl Drop for LoginSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AuthContext {
    pub fn new(store: Arc<dyn TokenStore>, backend: Arc<Backend>, resolvers: ResolverChain) -> Self {
        let (state, _) = watch::channel(AuthState::bootstrapping());
        AuthContext {
            store,
            backend,
            resolvers,
            state,
            bootstrapped: AtomicBool::new(false),
            login_in_flight: AtomicBool::new(false),
            generation: Mutex::new(0),
        }
    }

    /// A read-only view that is notified on every transition.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn backend(&self) -> &Arc<Backend> {
        &self.backend
    }

    /// The credential currently persisted, if any.
    pub fn current_token(&self) -> Option<String> {
        match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not read token store '{}': {}", self.store.name(), e);
                None
            }
        }
    }

    fn publish(&self, next: AuthState) {
        match &next.status {
            AuthStatus::Authenticated(session) => info!(
                "Auth state -> authenticated as '{}' ({})",
                session.user.email, session.user.user_type
            ),
            AuthStatus::Anonymous => info!("Auth state -> anonymous"),
            AuthStatus::Bootstrapping => debug!("Auth state -> bootstrapping"),
        }
        self.state.send_replace(next);
    }

    fn generation(&self) -> MutexGuard<'_, u64> {
        self.generation
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Takes the single slot shared by login and registration.
    fn claim_login_slot(&self, email: &str) -> Result<LoginSlot<'_>, AuthError> {
        if self
            .login_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Rejecting request for '{}': another login is in flight.", email);
            return Err(AuthError::LoginInProgress);
        }
        Ok(LoginSlot(&self.login_in_flight))
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            error!("Failed to clear token store '{}': {}", self.store.name(), e);
        }
    }

    /// Reconciles the stored token with the in-memory state. Runs once; later
    /// calls return the current state untouched. Never fails: every branch
    /// ends in `Authenticated` or `Anonymous` with `loading == false`.
    pub async fn bootstrap(&self) -> AuthState {
        if self.bootstrapped.swap(true, Ordering::AcqRel) {
            debug!("Bootstrap already ran; returning current state.");
            return self.snapshot();
        }

        let started = *self.generation();
        let guard = LoadingGuard::bootstrap(&self.state, &*self.store);
        let status = self.resolve_stored_token().await;
        {
            let generation = self.generation();
            let status = if *generation == started {
                status
            } else {
                info!("Logged out during bootstrap; discarding the resolved session.");
                AuthStatus::Anonymous
            };
            self.publish(AuthState {
                status,
                loading: false,
                error: None,
            });
        }
        guard.disarm();
        self.snapshot()
    }

    async fn resolve_stored_token(&self) -> AuthStatus {
        let token = match self.store.load() {
            Ok(Some(token)) => token,
            Ok(None) => {
                info!("No stored token found.");
                return AuthStatus::Anonymous;
            }
            Err(e) => {
                warn!("Token store unreadable, starting anonymous: {}", e);
                self.clear_store();
                return AuthStatus::Anonymous;
            }
        };

        info!("Found stored token '{}'; resolving session.", token_preview(&token));
        match self.resolvers.resolve(&token).await {
            Ok(user) => AuthStatus::Authenticated(Session::new(token, user)),
            Err(e) => {
                warn!("Stored token could not be resolved, discarding it: {}", e);
                self.clear_store();
                AuthStatus::Anonymous
            }
        }
    }

    /// Logs in and persists the new token.
    ///
    /// Rejected with [`AuthError::LoginInProgress`] while another login is in
    /// flight or the bootstrap has not finished, so two tokens can never race
    /// into the store. On failure the state becomes `Anonymous` with a
    /// user-safe `error`, and the error is returned for the form to show.
    /// A logout issued while the login is in flight wins: the new token is
    /// dropped and [`AuthError::Superseded`] is returned.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        role: LoginRole,
    ) -> Result<Session, AuthError> {
        let _slot = self.claim_login_slot(email)?;

        if self.state.borrow().is_bootstrapping() {
            warn!("Rejecting login for '{}': session is still bootstrapping.", email);
            return Err(AuthError::LoginInProgress);
        }

        let started = *self.generation();
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
        let guard = LoadingGuard::new(&self.state);

        let result = match self.establish_session(email, password, role).await {
            Ok(session) => self.commit_session(session, started),
            Err(e) => Err(e),
        };
        match &result {
            Ok(_) => {}
            Err(AuthError::Superseded) => {
                info!("Login for '{}' finished after a logout; token discarded.", email);
                self.state.send_modify(|state| state.loading = false);
            }
            Err(e) => {
                warn!("Login failed for '{}': {}", email, e);
                self.clear_store();
                self.publish(AuthState {
                    status: AuthStatus::Anonymous,
                    loading: false,
                    error: Some(e.user_message()),
                });
            }
        }
        guard.disarm();
        result
    }

    async fn establish_session(
        &self,
        email: &str,
        password: &str,
        role: LoginRole,
    ) -> Result<Session, AuthError> {
        let outcome = self.backend.login(email, password, role).await?;
        let user = match outcome.user {
            Some(user) => user,
            None => {
                debug!("Login response carried no identity; resolving the new token.");
                self.resolvers
                    .resolve(&outcome.token)
                    .await
                    .map_err(AuthError::InvalidResponse)?
            }
        };
        if user.user_type != role.user_type() {
            debug!(
                "Login as {} produced a {} session for '{}'",
                role, user.user_type, user.email
            );
        }
        Ok(Session::new(outcome.token, user))
    }

    /// Saves and publishes `session` unless a logout happened since
    /// `started`. Holds the generation lock across both writes.
    fn commit_session(&self, session: Session, started: u64) -> Result<Session, AuthError> {
        let generation = self.generation();
        if *generation != started {
            return Err(AuthError::Superseded);
        }
        self.store.save(&session.token).map_err(AuthError::Storage)?;
        self.publish(AuthState::authenticated(session.clone()));
        Ok(session)
    }

    /// Ends the session locally right away. The backend is told afterwards,
    /// best effort, and its answer does not matter. Safe to call repeatedly.
    ///
    /// Returns the handle of the background notification, if one was sent.
    /// Callers that exit right after logging out may await it; nobody has to.
    pub fn logout(&self) -> Option<JoinHandle<()>> {
        let token = self.current_token().or_else(|| {
            self.state
                .borrow()
                .session()
                .map(|session| session.token.clone())
        });

        {
            let mut generation = self.generation();
            *generation += 1;
            self.clear_store();
            let loading = self.login_in_flight.load(Ordering::Acquire);
            self.publish(AuthState {
                status: AuthStatus::Anonymous,
                loading,
                error: None,
            });
        }

        let Some(token) = token else {
            debug!("Logout without a stored token; nothing to notify.");
            return None;
        };
        match Handle::try_current() {
            Ok(handle) => {
                let backend = self.backend.clone();
                Some(handle.spawn(async move {
                    if let Err(e) = backend.notify_logout(&token).await {
                        debug!("Logout notification failed (ignored): {}", e);
                    }
                }))
            }
            Err(_) => {
                debug!("No async runtime available; skipping logout notification.");
                None
            }
        }
    }

    /// Called by the API client when an authenticated call came back 401.
    /// Logs out only if the rejected token is still the current one, so a
    /// late answer to an old request cannot end a newer session. Returns
    /// whether a logout happened.
    pub fn handle_unauthorized(&self, rejected_token: &str) -> bool {
        match self.current_token() {
            Some(current) if current == rejected_token => {
                warn!(
                    "Token '{}' was rejected by the backend; logging out.",
                    token_preview(rejected_token)
                );
                self.logout();
                true
            }
            _ => {
                debug!(
                    "Ignoring 401 for stale token '{}'.",
                    token_preview(rejected_token)
                );
                false
            }
        }
    }

    /// Edits the in-memory user of the current session. The user type stays
    /// whatever the token says. Returns the updated user, or `None` when
    /// nobody is logged in.
    pub fn update_user<F>(&self, update: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        let mut updated = None;
        self.state.send_if_modified(|state| match &mut state.status {
            AuthStatus::Authenticated(session) => {
                let user_type = session.user.user_type;
                update(&mut session.user);
                session.user.user_type = user_type;
                updated = Some(session.user.clone());
                true
            }
            _ => false,
        });
        updated
    }

    /// Creates an account. Freelancers are logged in straight away with the
    /// same credentials; companies must log in themselves afterwards.
    /// Shares the login slot, so it never overlaps a login.
    pub async fn register(&self, registration: &Registration) -> Result<Option<Session>, AuthError> {
        let outcome = {
            let _slot = self.claim_login_slot(registration.email())?;
            self.state.send_modify(|state| {
                state.loading = true;
                state.error = None;
            });
            let guard = LoadingGuard::new(&self.state);
            let outcome = self.backend.register(registration).await;
            let message = outcome.as_ref().err().map(AuthError::user_message);
            self.state.send_modify(|state| {
                state.loading = false;
                state.error = message;
            });
            guard.disarm();
            outcome
        };

        if let Err(e) = outcome {
            warn!("Registration failed for '{}': {}", registration.email(), e);
            return Err(e);
        }
        info!("Registered '{}'", registration.email());

        match registration {
            Registration::Company(_) => Ok(None),
            Registration::Freelancer(r) => self
                .login(&r.email, &r.password, LoginRole::Talent)
                .await
                .map(Some),
        }
    }

    pub async fn forgot_password(&self, email: &str, role: LoginRole) -> Result<(), AuthError> {
        self.backend.forgot_password(email, role).await
    }

    pub async fn reset_password(&self, reset_token: &str, password: &str) -> Result<(), AuthError> {
        self.backend.reset_password(reset_token, password).await
    }
}
