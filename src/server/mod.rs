pub mod config;
mod error_response;
mod hotel_routes;
mod http_layers;
mod music_request_routes;
pub mod server;
pub(self) mod session;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
