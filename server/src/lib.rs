pub mod binding;
pub mod config;
pub mod http;
