pub mod config;
pub mod crd;
pub mod server;
