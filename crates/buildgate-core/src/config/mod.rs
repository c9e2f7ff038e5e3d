//! buildgate.toml loading

mod model;

pub use model::{Config, GateConfig, CONFIG_FILE_NAME};
