pub mod context;
pub mod error;
pub mod state;

// Re-export so we can do "use crate::auth::{AuthContext, AuthState};"
pub use context::AuthContext;
pub use error::AuthError;
pub use state::{AuthState, AuthStatus};
