//! Builds a [`Gate`] from configuration.

use std::sync::Arc;

use tracing::info;

use crate::auth::AuthContext;
use crate::config::ConfigV1;
use crate::guard::Routes;
use crate::http::{ApiClient, Backend};
use crate::resolvers::ResolverChain;
use crate::state::Gate;
use crate::store::create_store;

/// Wires the token store, backend client, resolvers and auth context.
///
/// Nothing is resolved yet: the returned gate is `Bootstrapping` until
/// `gate.auth.bootstrap()` runs.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn build(config: Arc<ConfigV1>) -> Result<Gate, Box<dyn std::error::Error>> {
    let store = create_store(&config.store);
    let backend = Arc::new(Backend::new(&config.api, &config.endpoints)?);
    let resolvers = ResolverChain::new(&config.auth.resolvers, &backend, config.auth.timeout());

    info!(
        "Session gate ready for {} (guard ceiling {:?})",
        config.api.base_url,
        config.guard.ceiling()
    );

    let auth = Arc::new(AuthContext::new(store, backend, resolvers));
    Ok(Gate {
        api: ApiClient::new(auth.clone()),
        routes: Routes::new(&config.routes),
        auth,
        config,
    })
}
