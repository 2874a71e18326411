//! Wire shapes exchanged with the backend's auth endpoints.
//!
//! The backend is not consistent about where it puts the identity in a
//! response: `/auth/login` answers `{token, entreprise}`, `/freelances/login`
//! answers `{token, freelance}` or the bare record, and `/auth/me` answers
//! `{user}`. Everything here funnels those variants into one [`User`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::user::{LoginRole, User, UserType};

/// Body of `POST /auth/login`.
#[derive(Serialize, Debug, Clone)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub role: LoginRole,
}

/// Envelope keys that may wrap an identity, with the user type they imply.
const IDENTITY_ENVELOPES: [(&str, Option<UserType>); 4] = [
    ("user", None),
    ("entreprise", Some(UserType::Company)),
    ("freelance", Some(UserType::Freelancer)),
    ("admin", Some(UserType::Admin)),
];

/// An identity record as the backend sends it, before normalization.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct IdentityPayload {
    #[serde(default, alias = "user_id")]
    pub id: Option<Value>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName", alias = "surname")]
    pub last_name: Option<String>,
    #[serde(default, alias = "userType", alias = "role")]
    pub user_type: Option<String>,
}

impl IdentityPayload {
    /// Normalizes the record. The user type comes from the record itself,
    /// then from `implied` (envelope key or login role).
    pub fn into_user(self, implied: Option<UserType>) -> Result<User, String> {
        let id = match self.id {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => return Err(format!("Identity has an invalid id: {}", other)),
            None => return Err("Identity is missing an id".to_string()),
        };
        let email = self
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| "Identity is missing an email".to_string())?;
        let user_type = self
            .user_type
            .as_deref()
            .and_then(UserType::from_backend_role)
            .or(implied)
            .ok_or_else(|| "Identity does not state a user type".to_string())?;

        Ok(User::new(
            id,
            self.first_name.unwrap_or_default(),
            self.last_name.unwrap_or_default(),
            email,
            user_type,
        ))
    }
}

/// Locates an identity inside a response body, looking at the known
/// envelopes first and at the top-level object last.
pub fn extract_identity(body: &Value) -> Option<(IdentityPayload, Option<UserType>)> {
    for (key, implied) in IDENTITY_ENVELOPES {
        if let Some(inner) = body.get(key).filter(|v| v.is_object()) {
            if let Ok(payload) = serde_json::from_value::<IdentityPayload>(inner.clone()) {
                return Some((payload, implied));
            }
        }
    }

    if body.get("email").is_some() {
        if let Ok(payload) = serde_json::from_value::<IdentityPayload>(body.clone()) {
            return Some((payload, None));
        }
    }
    None
}

/// A login answer reduced to what the session needs.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    /// `None` when the backend only returned a token.
    pub user: Option<User>,
}

/// Parses `{token, user?}` in any of the backend's flavours.
pub fn parse_login_response(body: &Value, role: LoginRole) -> Result<LoginOutcome, String> {
    let token = body
        .get("token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| "Login response carries no token".to_string())?
        .to_string();

    let user = match extract_identity(body) {
        Some((payload, implied)) => Some(payload.into_user(implied.or(Some(role.user_type())))?),
        None => None,
    };

    Ok(LoginOutcome { token, user })
}

/// Pulls a human readable error out of a 4xx body (`message` or `error`).
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Body of `POST /auth/signup/company`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CompanyRegistration {
    pub first_name: String,
    pub surname: String,
    pub organization_size: String,
    pub phone_number: String,
    pub email: String,
    pub password: String,
    pub accept_terms: bool,
    pub accept_marketing: bool,
}

/// Body of `POST /freelances/register`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FreelancerRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub bio: String,
    pub accept_terms: bool,
    pub accept_marketing: bool,
}

#[derive(Debug, Clone)]
pub enum Registration {
    Company(CompanyRegistration),
    Freelancer(FreelancerRegistration),
}

impl Registration {
    pub fn email(&self) -> &str {
        match self {
            Registration::Company(r) => &r.email,
            Registration::Freelancer(r) => &r.email,
        }
    }
}
