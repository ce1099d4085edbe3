pub mod auth;
pub mod chat;
pub mod middleware;
pub mod quiz;
pub mod rest;
pub mod state;
#[cfg(test)]
pub(crate) mod testing;

pub use middleware::require_auth;
pub use rest::ApiDoc;
