use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::user::{User, UserType};

/// Claims carried by the backend's bearer tokens.
///
/// The backend signs `{ id, email, role }` and may add names. Ids arrive as
/// numbers from some endpoints and strings from others.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenClaims {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub email: String,
    pub role: String,
    #[serde(default, alias = "firstName")]
    pub first_name: Option<String>,
    #[serde(default, alias = "lastName", alias = "surname")]
    pub last_name: Option<String>,
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Builds the identity these claims describe, if the role is one we know.
    pub fn to_user(&self) -> Result<User, String> {
        let user_type = UserType::from_backend_role(&self.role)
            .ok_or_else(|| format!("Token carries unknown role '{}'", self.role))?;
        Ok(User::new(
            self.id.clone(),
            self.first_name.clone().unwrap_or_default(),
            self.last_name.clone().unwrap_or_default(),
            self.email.clone(),
            user_type,
        ))
    }
}

/// Accepts `12` as well as `"12"` for identifier fields.
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number identifier, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_ids_are_stringified() {
        let claims: TokenClaims =
            serde_json::from_value(json!({"id": 13, "email": "c@x.com", "role": "entreprise"}))
                .unwrap();
        assert_eq!(claims.id, "13");
        let user = claims.to_user().unwrap();
        assert_eq!(user.user_type, UserType::Company);
        assert_eq!(user.first_name, "");
    }

    #[test]
    fn unknown_role_is_rejected() {
        let claims: TokenClaims =
            serde_json::from_value(json!({"id": "1", "email": "c@x.com", "role": "root"}))
                .unwrap();
        assert!(claims.to_user().is_err());
    }
}
