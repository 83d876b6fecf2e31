pub mod chat;
pub mod config;
pub mod db;
pub mod gemini;
pub mod lyrics;
pub mod models;
pub mod server;
pub mod transcript;

pub use config::AppConfig;
pub use server::run_server;
