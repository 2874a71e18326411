use thiserror::Error;

/// Why a login (or a registration / password call) did not go through.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The backend answered with a 4xx.
    #[error("credentials rejected ({status}): {message}")]
    CredentialsRejected { status: u16, message: String },

    /// The backend could not be reached, timed out, or failed with a 5xx.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// Another login is still in flight, or the session is bootstrapping.
    #[error("a login is already in progress")]
    LoginInProgress,

    /// A logout happened while the login was in flight; its token was dropped.
    #[error("login superseded by a logout")]
    Superseded,

    #[error("invalid response from backend: {0}")]
    InvalidResponse(String),

    #[error("token storage failed: {0}")]
    Storage(String),
}

impl AuthError {
    /// Text that is safe to show next to a form.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::CredentialsRejected { message, .. } if !message.is_empty() => {
                message.clone()
            }
            AuthError::CredentialsRejected { .. } => "Invalid email or password".to_string(),
            AuthError::NetworkFailure(_) => {
                "Connection error: unable to reach the server. Please check your connection."
                    .to_string()
            }
            AuthError::LoginInProgress => "A login is already in progress".to_string(),
            AuthError::Superseded => "You were logged out before the login completed".to_string(),
            AuthError::InvalidResponse(_) | AuthError::Storage(_) => {
                "An error occurred during login".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_credentials_prefer_backend_message() {
        let err = AuthError::CredentialsRejected {
            status: 401,
            message: "Mot de passe incorrect".to_string(),
        };
        assert_eq!(err.user_message(), "Mot de passe incorrect");

        let err = AuthError::CredentialsRejected {
            status: 403,
            message: String::new(),
        };
        assert_eq!(err.user_message(), "Invalid email or password");
    }

    #[test]
    fn network_failures_stay_generic() {
        let err = AuthError::NetworkFailure("dns error: no such host".to_string());
        assert!(err.user_message().starts_with("Connection error"));
        assert!(!err.user_message().contains("dns"));
    }
}
