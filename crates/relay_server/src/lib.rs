//! Relay server: HTTP surface for the download/resolve proxy.
mod client_ip;
mod error;
mod routes;

pub mod config;
pub mod logging;
pub mod state;

pub use routes::router;
