// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Login, the connectivity checks, and the role endpoints. The dashboard
// resolver reads an optional bearer token: a missing or invalid one simply
// means "no session".

pub mod auth;
pub mod dashboard;
pub mod system;
pub mod users;
