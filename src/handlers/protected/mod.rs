// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Middleware: jwt_auth_middleware injects AuthUser before these run.

pub mod auth;
