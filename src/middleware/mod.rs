pub mod auth;
pub mod rate_limit;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use rate_limit::{rate_limit_middleware, RateLimiter};
