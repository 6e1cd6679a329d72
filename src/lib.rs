pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod seed;
pub mod server;
pub mod services;
pub mod supabase;

#[cfg(test)]
pub mod testing;
