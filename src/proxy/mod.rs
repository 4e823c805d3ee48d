//! HTTP proxy server

mod handler;
pub mod server;
mod streaming;

pub use handler::CompletionHandler;
pub use server::{build_router, run_server, ProxyState};
pub use streaming::relay_response;
