use std::collections::HashSet;

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::models::{TokenClaims, User};
use crate::resolvers::Resolver;

/// Settings for reading the identity out of the token itself.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Default)]
#[serde(default)]
pub struct ClaimsResolverConfig {
    /// Shared HMAC secret. Without it the signature is not checked and the
    /// claims are only trusted as far as the backend later accepts the token.
    pub secret: Option<String>,
}

/// Decodes `{ id, email, role }` claims from a JWT without a network call.
pub struct ClaimsResolver {
    config: ClaimsResolverConfig,
}

impl ClaimsResolver {
    pub fn new(config: &ClaimsResolverConfig) -> Self {
        info!(
            "Creating claims resolver (signature check: {})",
            config.secret.is_some()
        );
        Self {
            config: config.clone(),
        }
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.validate_aud = false;
        // Tokens without `exp` are accepted; those with one must not be expired.
        validation.required_spec_claims = HashSet::new();
        if self.config.secret.is_none() {
            validation.insecure_disable_signature_validation();
        }
        validation
    }
}

#[async_trait::async_trait]
impl Resolver for ClaimsResolver {
    fn get_name(&self) -> &str {
        "claims"
    }

    async fn resolve(&self, token: &str) -> Result<User, String> {
        let header =
            decode_header(token).map_err(|e| format!("Failed to decode JWT header: {}", e))?;

        let alg = match header.alg {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => header.alg,
            _ if self.config.secret.is_none() => header.alg,
            other => return Err(format!("Unsupported JWT algorithm: {:?}", other)),
        };

        let secret = self.config.secret.clone().unwrap_or_default();
        let decoded = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &self.validation(alg),
        )
        .map_err(|e| format!("Failed to decode JWT: {}", e))?;
        debug!(
            "Decoded token claims for '{}' with role '{}'",
            decoded.claims.email, decoded.claims.role
        );

        decoded.claims.to_user()
    }
}
