use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The role discriminator deciding which views a session may access.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Freelancer,
    Company,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Freelancer => "freelancer",
            UserType::Company => "company",
            UserType::Admin => "admin",
        }
    }

    /// Maps the role names the backend puts into tokens and payloads.
    /// The backend speaks French for companies ("entreprise") and uses
    /// "freelance"/"talent" interchangeably for freelancers.
    pub fn from_backend_role(role: &str) -> Option<Self> {
        match role.trim().to_lowercase().as_str() {
            "freelancer" | "freelance" | "talent" => Some(UserType::Freelancer),
            "company" | "entreprise" | "enterprise" => Some(UserType::Company),
            "admin" => Some(UserType::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserType::from_backend_role(s).ok_or_else(|| format!("unknown user type '{}'", s))
    }
}

/// The role a login form submits. Talent logins produce freelancer sessions.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoginRole {
    Talent,
    Company,
    Admin,
}

impl LoginRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginRole::Talent => "talent",
            LoginRole::Company => "company",
            LoginRole::Admin => "admin",
        }
    }

    /// The user type a successful login with this role is expected to yield.
    pub fn user_type(&self) -> UserType {
        match self {
            LoginRole::Talent => UserType::Freelancer,
            LoginRole::Company => UserType::Company,
            LoginRole::Admin => UserType::Admin,
        }
    }
}

impl fmt::Display for LoginRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoginRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "talent" | "freelancer" | "freelance" => Ok(LoginRole::Talent),
            "company" | "entreprise" => Ok(LoginRole::Company),
            "admin" => Ok(LoginRole::Admin),
            other => Err(format!(
                "unknown login role '{}', expected talent, company or admin",
                other
            )),
        }
    }
}

/// The decoded identity behind a session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub user_type: UserType,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        user_type: UserType,
    ) -> Self {
        User {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            user_type,
        }
    }

    /// Name shown in the layout header, falling back to the email.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.email.clone()
        } else {
            full.to_string()
        }
    }
}

/// An authenticated identity together with the bearer token it was resolved from.
///
/// A `Session` only exists once the token has been validated, so holding one
/// means both fields are present.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub established_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Session {
            token: token.into(),
            user,
            established_at: Utc::now(),
        }
    }

    pub fn user_type(&self) -> UserType {
        self.user.user_type
    }
}

/// Shortens a token for log output; full tokens never reach the logs.
pub fn token_preview(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    if prefix.len() < token.len() {
        format!("{}...", prefix)
    } else {
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_role_names_map_to_user_types() {
        assert_eq!(
            UserType::from_backend_role("entreprise"),
            Some(UserType::Company)
        );
        assert_eq!(
            UserType::from_backend_role("Freelance"),
            Some(UserType::Freelancer)
        );
        assert_eq!(UserType::from_backend_role("admin"), Some(UserType::Admin));
        assert_eq!(UserType::from_backend_role("guest"), None);
    }

    #[test]
    fn talent_login_yields_freelancer() {
        let role: LoginRole = "talent".parse().unwrap();
        assert_eq!(role, LoginRole::Talent);
        assert_eq!(role.user_type(), UserType::Freelancer);
        assert!("visitor".parse::<LoginRole>().is_err());
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let user = User::new("1", "", "", "a@x.com", UserType::Company);
        assert_eq!(user.display_name(), "a@x.com");

        let user = User::new("2", "Ada", "Lovelace", "ada@x.com", UserType::Freelancer);
        assert_eq!(user.display_name(), "Ada Lovelace");
    }

    #[test]
    fn token_preview_truncates_long_tokens() {
        assert_eq!(token_preview("abcdefghijklmnop"), "abcdefgh...");
        assert_eq!(token_preview("short"), "short");
    }

    #[test]
    fn session_serializes_with_rfc3339_timestamp() {
        let session = Session::new("t1", User::new("1", "A", "B", "a@x.com", UserType::Company));
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["token"], "t1");
        assert_eq!(value["user"]["user_type"], "company");
        let stamp = value["established_at"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }
}
