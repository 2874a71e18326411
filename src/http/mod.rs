pub mod backend;
pub mod client;

pub use backend::Backend;
pub use client::{ApiClient, ApiError};
