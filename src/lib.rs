//! Config keeper library
//!
//! Renders a child process's configuration from a mounted source file and a
//! template, then keeps that child running on the latest rendered output.

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod orchestrator;
pub mod process;
pub mod render;
pub mod watch;

pub use config::schema::KeeperSettings;
pub use lifecycle::Shutdown;
pub use orchestrator::{Keeper, KeeperError};
