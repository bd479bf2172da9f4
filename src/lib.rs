//! NLP gateway - forwards text-analysis requests to upstream NLP services and persists records

pub mod config;
pub mod error;
pub mod types;

pub mod store;
pub mod upstream;
pub mod api;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;
