// handlers/elevated/mod.rs - Elevated handlers (super admin bearer required)
//
// Middleware: jwt_auth_middleware; each handler checks the super-admin identity itself.

pub mod admin;
