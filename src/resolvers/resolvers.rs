use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{
    claims_resolver::{ClaimsResolver, ClaimsResolverConfig},
    profile_resolver::{ProfileResolver, ProfileResolverConfig},
    whoami_resolver::WhoAmIResolver,
};
use crate::http::Backend;
use crate::models::User;

/// The ways a stored token can be turned back into a user.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
#[serde(tag = "type")]
pub enum ResolverConfig {
    /// Read the identity straight out of the token's claims.
    #[serde(rename = "claims")]
    Claims(ClaimsResolverConfig),
    /// Ask the backend's "who am I" endpoint.
    #[serde(rename = "who-am-i")]
    WhoAmI,
    /// Fetch a role-specific profile (e.g. `/freelances/me`).
    #[serde(rename = "profile")]
    Profile(ProfileResolverConfig),
}

/// A resolver must be able to return the user a token belongs to, or an error.
#[async_trait::async_trait]
pub trait Resolver: Send + Sync {
    fn get_name(&self) -> &str;
    async fn resolve(&self, token: &str) -> Result<User, String>;
}

/// Create a resolver from a given config.
pub fn create_resolver(config: &ResolverConfig, backend: &Arc<Backend>) -> Box<dyn Resolver> {
    match config {
        ResolverConfig::Claims(cfg) => Box::new(ClaimsResolver::new(cfg)),
        ResolverConfig::WhoAmI => Box::new(WhoAmIResolver::new(backend.clone())),
        ResolverConfig::Profile(cfg) => Box::new(ProfileResolver::new(cfg, backend.clone())),
    }
}
