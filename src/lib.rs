pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod services;
pub mod sheets;
pub mod state;
pub mod types;

#[cfg(test)]
pub mod testing;
