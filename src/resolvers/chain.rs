use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::{create_resolver, Resolver, ResolverConfig};
use crate::http::Backend;
use crate::models::user::token_preview;
use crate::models::User;

/// Tries each configured resolver in order and stops at the first success.
///
/// Each attempt is wrapped in a timeout so a backend that never answers
/// cannot keep the bootstrap pending forever.
pub struct ResolverChain {
    resolvers: Vec<Box<dyn Resolver>>,
    timeout: Duration,
}

impl ResolverChain {
    pub fn new(configs: &[ResolverConfig], backend: &Arc<Backend>, timeout: Duration) -> Self {
        info!("Creating session resolvers...");
        let resolvers = configs
            .iter()
            .map(|config| create_resolver(config, backend))
            .collect();
        Self::from_resolvers(resolvers, timeout)
    }

    pub fn from_resolvers(resolvers: Vec<Box<dyn Resolver>>, timeout: Duration) -> Self {
        ResolverChain { resolvers, timeout }
    }

    pub async fn resolve(&self, token: &str) -> Result<User, String> {
        if self.resolvers.is_empty() {
            warn!("No session resolvers configured; stored tokens cannot be resolved.");
            return Err("No session resolvers configured".to_string());
        }

        let mut last_error = String::new();
        for resolver in &self.resolvers {
            debug!(
                "Resolving token '{}' with '{}'",
                token_preview(token),
                resolver.get_name()
            );
            match timeout(self.timeout, resolver.resolve(token)).await {
                Ok(Ok(user)) => {
                    info!(
                        "Resolver '{}' resolved user '{}' ({})",
                        resolver.get_name(),
                        user.email,
                        user.user_type
                    );
                    return Ok(user);
                }
                Ok(Err(e)) => {
                    debug!("Resolver '{}' failed: {}", resolver.get_name(), e);
                    last_error = format!("Resolver '{}' failed: {}", resolver.get_name(), e);
                }
                Err(_) => {
                    warn!(
                        "Resolver '{}' timed out after {:?}",
                        resolver.get_name(),
                        self.timeout
                    );
                    last_error = format!("Resolver '{}' timed out", resolver.get_name());
                }
            }
        }

        warn!("All resolvers failed; last error: {}", last_error);
        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserType;

    struct Fixed(Result<User, String>);

    #[async_trait::async_trait]
    impl Resolver for Fixed {
        fn get_name(&self) -> &str {
            "fixed"
        }

        async fn resolve(&self, _token: &str) -> Result<User, String> {
            self.0.clone()
        }
    }

    struct Hanging;

    #[async_trait::async_trait]
    impl Resolver for Hanging {
        fn get_name(&self) -> &str {
            "hanging"
        }

        async fn resolve(&self, _token: &str) -> Result<User, String> {
            std::future::pending().await
        }
    }

    fn company() -> User {
        User::new("1", "Acme", "SA", "c@x.com", UserType::Company)
    }

    #[tokio::test]
    async fn falls_through_to_the_next_resolver() {
        let chain = ResolverChain::from_resolvers(
            vec![
                Box::new(Fixed(Err("not a freelancer".to_string()))),
                Box::new(Fixed(Ok(company()))),
            ],
            Duration::from_secs(1),
        );
        let user = chain.resolve("t").await.unwrap();
        assert_eq!(user.user_type, UserType::Company);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_resolver_times_out() {
        let chain = ResolverChain::from_resolvers(
            vec![Box::new(Hanging), Box::new(Fixed(Ok(company())))],
            Duration::from_millis(100),
        );
        assert!(chain.resolve("t").await.is_ok());
    }

    #[tokio::test]
    async fn empty_chain_fails() {
        let chain = ResolverChain::from_resolvers(vec![], Duration::from_secs(1));
        assert!(chain.resolve("t").await.is_err());
    }
}
