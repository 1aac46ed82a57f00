pub mod http_handler;
pub mod render;
pub mod server;
