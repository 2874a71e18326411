pub mod payload;
pub mod token;
pub mod user;

pub use payload::{LoginOutcome, Registration};
pub use token::TokenClaims;
pub use user::{LoginRole, Session, User, UserType};
