//! Deployment configuration
//!
//! deploy.toml is read once per run and turned into an immutable
//! [`Settings`] value:
//! - `[package_manager]`: endpoints, credentials, timeout, success markers
//! - `[ports]`: default author/publish ports
//! - `[package]`: extraction root, size limit, reference filter root
//! - `[environments.<name>]`: token and build permission
//! - `[servers.<token>.<pool>]`: author/publish server lists

pub mod parser;
pub mod paths;
pub mod resolver;
pub mod schema;
pub mod servers;
pub mod settings;

pub use parser::{load_settings, parse_settings_str};
pub use paths::{default_config_path, reference_filter_path};
pub use resolver::{Resolution, resolve};
pub use servers::{ServerEntry, ServerTable, parse_server_list};
pub use settings::{
    Credentials, EnvironmentSettings, PackageManagerSettings, PackageSettings, PortDefaults,
    Settings,
};
