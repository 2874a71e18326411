use std::sync::Arc;

use tracing::{debug, info};

use crate::http::Backend;
use crate::models::payload::extract_identity;
use crate::models::User;
use crate::resolvers::Resolver;

/// Resolves a token by asking the backend who it belongs to.
pub struct WhoAmIResolver {
    backend: Arc<Backend>,
}

impl WhoAmIResolver {
    pub fn new(backend: Arc<Backend>) -> Self {
        info!(
            "Creating who-am-i resolver against '{}'",
            backend.url(&backend.endpoints().me)
        );
        Self { backend }
    }
}

#[async_trait::async_trait]
impl Resolver for WhoAmIResolver {
    fn get_name(&self) -> &str {
        "who-am-i"
    }

    async fn resolve(&self, token: &str) -> Result<User, String> {
        let path = self.backend.endpoints().me.clone();
        let body = self.backend.fetch_identity(&path, token).await?;
        let (payload, implied) = extract_identity(&body)
            .ok_or_else(|| "who-am-i response carries no identity".to_string())?;
        let user = payload.into_user(implied)?;
        debug!("who-am-i resolved user '{}' ({})", user.email, user.user_type);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, EndpointsConfig};
    use crate::models::UserType;
    use mockito::Server;

    fn backend_for(url: String) -> Arc<Backend> {
        let api = ApiConfig {
            base_url: url,
            timeout_in_ms: 2000,
        };
        Arc::new(Backend::new(&api, &EndpointsConfig::default()).expect("client should build"))
    }

    /// A valid token yields the user described by the `{user}` envelope.
    #[tokio::test]
    async fn test_who_am_i_success() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/auth/me")
            .match_header("authorization", "Bearer t1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"user": {"id": 3, "email": "a@x.com", "userType": "freelancer"}}"#)
            .create_async()
            .await;

        let resolver = WhoAmIResolver::new(backend_for(server.url()));
        let user = resolver.resolve("t1").await.expect("token should resolve");
        m.assert_async().await;
        assert_eq!(user.id, "3");
        assert_eq!(user.user_type, UserType::Freelancer);
    }

    /// A revoked token (401) is an error, not a user.
    #[tokio::test]
    async fn test_who_am_i_rejected() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/auth/me")
            .with_status(401)
            .with_body(r#"{"message": "Accès refusé : token invalide"}"#)
            .create_async()
            .await;

        let resolver = WhoAmIResolver::new(backend_for(server.url()));
        let result = resolver.resolve("expired").await;
        m.assert_async().await;
        assert!(result.is_err());
    }

    /// An identity without a user type cannot become a session.
    #[tokio::test]
    async fn test_who_am_i_untyped_identity() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/auth/me")
            .with_status(200)
            .with_body(r#"{"user": {"id": 3, "email": "a@x.com"}}"#)
            .create_async()
            .await;

        let resolver = WhoAmIResolver::new(backend_for(server.url()));
        assert!(resolver.resolve("t1").await.is_err());
    }
}
