//! Client-side session gate: one owned auth context, a durable token store,
//! route guards and role layouts that share a single access rule.

pub mod auth;
pub mod config;
pub mod guard;
pub mod http;
pub mod models;
pub mod resolvers;
pub mod startup;
pub mod state;
pub mod store;
pub mod utils;
