//! Configuration values shared by service processes and the loader that
//! reads them from a directory of JSON or YAML files.

mod loader;
mod types;

pub use loader::{CONFIG_DIR, ConfigError, load, load_dir};
pub use types::{Application, ClientConfig, Clients};
