//! Session authentication

pub mod jwt;
pub mod middleware;

pub use jwt::{JwtError, JwtManager, SessionClaims};
pub use middleware::{require_auth, AuthState, AuthUser, SESSION_COOKIE};
