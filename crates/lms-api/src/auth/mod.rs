//! Token consumption. Tokens are issued by an external identity provider;
//! this service only verifies them and reads the caller's identity and role.

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, Role};
pub use middleware::AuthUser;
