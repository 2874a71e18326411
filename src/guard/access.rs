use std::time::Duration;

use crate::auth::{AuthState, AuthStatus};
use crate::models::UserType;

/// Outcome of checking a view's requirement against the auth state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The state is still loading and the ceiling has not been reached.
    Pending,
    Allowed,
    Denied(Denial),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    NotAuthenticated,
    WrongUserType { actual: UserType, required: UserType },
}

/// The one access rule shared by route guards and layout shells.
///
/// While the state is loading the answer is `Pending`, until `elapsed`
/// reaches `ceiling`; from then on it is `Allowed` (fail-open). This only
/// keeps the UI from spinning forever: the backend still checks every call.
/// Once loaded, access requires an authenticated session whose user type
/// matches `required`, when one is given.
pub fn resolve_access(
    state: &AuthState,
    required: Option<UserType>,
    elapsed: Duration,
    ceiling: Duration,
) -> Access {
    if state.loading || state.is_bootstrapping() {
        return if elapsed >= ceiling {
            Access::Allowed
        } else {
            Access::Pending
        };
    }

    match (&state.status, required) {
        (AuthStatus::Authenticated(_), None) => Access::Allowed,
        (AuthStatus::Authenticated(session), Some(required)) => {
            let actual = session.user_type();
            if actual == required {
                Access::Allowed
            } else {
                Access::Denied(Denial::WrongUserType { actual, required })
            }
        }
        _ => Access::Denied(Denial::NotAuthenticated),
    }
}

/// Whether a `resolve_access` answer of `Allowed` came from the ceiling
/// rather than from the session.
pub fn is_fail_open(state: &AuthState, elapsed: Duration, ceiling: Duration) -> bool {
    (state.loading || state.is_bootstrapping()) && elapsed >= ceiling
}
