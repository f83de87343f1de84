//! Configuration types and re-exports

pub use super::{ApiConfig, AppConfig, ModelConfig, ServerConfig};
