pub mod access;
pub mod layout;
pub mod route_guard;
pub mod routes;

pub use access::{resolve_access, Access, Denial};
pub use layout::{LayoutShell, ShellChrome, ShellView};
pub use route_guard::{GuardState, RouteGuard};
pub use routes::Routes;
