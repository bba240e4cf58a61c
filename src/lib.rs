pub mod access;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod roles;
pub mod server;
pub mod session;
pub mod state;

#[cfg(test)]
pub mod testing;
