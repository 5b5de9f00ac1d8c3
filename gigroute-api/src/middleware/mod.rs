pub mod auth;

pub use auth::{manager_auth_middleware, ManagerClaims};
