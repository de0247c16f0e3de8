pub mod chain;
pub mod config;
pub mod error;
pub mod plugin_host;

pub use chain::TransformChain;
pub use config::{PipelineConfig, TransformConfig};
pub use error::EngineError;
pub use plugin_host::PluginRegistry;
