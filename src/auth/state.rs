use crate::models::{Session, User, UserType};

/// Where the process-wide session currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// The stored token has not been reconciled yet.
    Bootstrapping,
    Authenticated(Session),
    Anonymous,
}

/// The single published authentication state.
///
/// `loading` is true while bootstrapping and while a login is in flight.
/// `error` holds the last login failure, cleared by the next attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub status: AuthStatus,
    pub loading: bool,
    pub error: Option<String>,
}

impl AuthState {
    pub fn bootstrapping() -> Self {
        AuthState {
            status: AuthStatus::Bootstrapping,
            loading: true,
            error: None,
        }
    }

    pub fn anonymous() -> Self {
        AuthState {
            status: AuthStatus::Anonymous,
            loading: false,
            error: None,
        }
    }

    pub fn authenticated(session: Session) -> Self {
        AuthState {
            status: AuthStatus::Authenticated(session),
            loading: false,
            error: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.status, AuthStatus::Authenticated(_))
    }

    pub fn is_bootstrapping(&self) -> bool {
        matches!(self.status, AuthStatus::Bootstrapping)
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.status {
            AuthStatus::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.session().map(|s| &s.user)
    }

    pub fn user_type(&self) -> Option<UserType> {
        self.session().map(Session::user_type)
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::bootstrapping()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_only_exists_when_authenticated() {
        assert!(AuthState::bootstrapping().user().is_none());
        assert!(AuthState::anonymous().user().is_none());

        let session = Session::new(
            "t1",
            User::new("1", "Ada", "L", "a@x.com", UserType::Freelancer),
        );
        let state = AuthState::authenticated(session);
        assert!(state.is_authenticated());
        assert!(!state.loading);
        assert_eq!(state.user_type(), Some(UserType::Freelancer));
    }
}
