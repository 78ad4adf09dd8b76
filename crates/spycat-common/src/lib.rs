pub mod config;
pub mod logging;

pub const APP_NAME: &str = "spycat";

pub use config::{BreedsConfig, ConfigError, DatabaseConfig, ServerConfig, SpyCatConfig};
