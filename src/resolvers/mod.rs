pub mod chain;
pub mod claims_resolver;
pub mod profile_resolver;
pub mod resolvers;
pub mod whoami_resolver;

// Re-export from resolvers.rs so we can do "use crate::resolvers::*;"
pub use chain::ResolverChain;
pub use resolvers::*;
