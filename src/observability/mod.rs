//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Container log collection (stdout/stderr)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every lifecycle event (pid, path, fingerprint)
//! - JSON format for production, pretty format for development
//! - The Prometheus exporter only runs when enabled in settings

pub mod logging;
pub mod metrics;
