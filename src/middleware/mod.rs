pub mod auth;
pub mod response;

pub use auth::{jwt_auth_middleware, optional_session, AuthUser};
pub use response::{ApiResponse, ApiResult};
