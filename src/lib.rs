pub mod config;
pub mod entities;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod state;
pub mod types;
pub mod upstream;
