//! Keeper settings subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → loader.rs (optional TOML file)
//!     → loader.rs (environment overrides, child argv)
//!     → validation.rs (invalid values replaced by defaults, logged)
//!     → KeeperSettings (immutable)
//!     → shared via Arc with every component
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once loaded; no component reads the
//!   environment after startup
//! - Bad values never abort startup, they degrade to defaults
//! - Environment access goes through a lookup closure

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_settings, ConfigError};
pub use schema::{
    HealthCheckConfig, KeeperSettings, LogFormat, ObservabilityConfig, ProcessConfig,
    SourceConfig,
};
