pub mod http;

pub use http::{AppState, HttpServer, HttpServerConfig};
