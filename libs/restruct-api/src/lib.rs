pub mod config;
pub mod error;
pub mod json;
pub mod plugin;
pub mod record;
pub mod schema;
pub mod transform;
pub mod value;

pub use restruct_api_derive::ConfigParams;
