pub mod dispatch_config;
pub mod loader;

pub use dispatch_config::DispatchConfig;
pub use loader::{load_config, ConfigLoader};
