//! File-system storage: the daemon configuration file, its location, and the
//! service's own TOML configuration.

pub mod conf_file;
pub mod paths;
pub mod service_config;

pub use conf_file::ConfFileStore;
pub use paths::{resolve_conf_path, resolve_data_dir, PathError};
pub use service_config::{load_service_config, ServiceConfigError};
