use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::http::Backend;
use crate::models::payload::extract_identity;
use crate::models::{User, UserType};
use crate::resolvers::Resolver;

/// A role-specific "my profile" endpoint. A token the endpoint accepts
/// belongs to a user of `user_type`.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone)]
pub struct ProfileResolverConfig {
    pub path: String,
    pub user_type: UserType,
}

pub struct ProfileResolver {
    config: ProfileResolverConfig,
    name: String,
    backend: Arc<Backend>,
}

impl ProfileResolver {
    pub fn new(config: &ProfileResolverConfig, backend: Arc<Backend>) -> Self {
        info!(
            "Creating profile resolver for {} at '{}'",
            config.user_type, config.path
        );
        Self {
            name: format!("profile:{}", config.user_type),
            config: config.clone(),
            backend,
        }
    }
}

#[async_trait::async_trait]
impl Resolver for ProfileResolver {
    fn get_name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, token: &str) -> Result<User, String> {
        let body = self.backend.fetch_identity(&self.config.path, token).await?;
        let (payload, _) = extract_identity(&body)
            .ok_or_else(|| format!("{} response carries no identity", self.config.path))?;
        // The endpoint decides the role; whatever the record says is ignored.
        let mut user = payload.into_user(Some(self.config.user_type))?;
        user.user_type = self.config.user_type;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, EndpointsConfig};
    use mockito::Server;

    #[tokio::test]
    async fn company_profile_resolves_company_user() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/entreprise/me")
            .match_header("authorization", "Bearer t-company")
            .with_status(200)
            .with_body(r#"{"id": 12, "email": "c@x.com", "first_name": "Acme", "surname": "SA"}"#)
            .create_async()
            .await;

        let backend = Backend::new(
            &ApiConfig {
                base_url: server.url(),
                timeout_in_ms: 2000,
            },
            &EndpointsConfig::default(),
        )
        .unwrap();
        let resolver = ProfileResolver::new(
            &ProfileResolverConfig {
                path: "/entreprise/me".to_string(),
                user_type: UserType::Company,
            },
            Arc::new(backend),
        );

        let user = resolver.resolve("t-company").await.expect("profile should resolve");
        m.assert_async().await;
        assert_eq!(user.user_type, UserType::Company);
        assert_eq!(user.last_name, "SA");
        assert_eq!(resolver.get_name(), "profile:company");
    }
}
