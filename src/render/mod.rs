//! Configuration rendering subsystem.
//!
//! # Data Flow
//! ```text
//! source document (YAML) ─┐
//!                         ├─→ engine.rs (pure render) → output.rs (atomic write)
//! template (Jinja-style) ─┘                                  → destination file
//! ```
//!
//! # Design Decisions
//! - Rendering is a pure function; persistence is the caller's job
//! - The destination is always replaced whole, never patched
//! - A failed render leaves the previous destination in place

pub mod engine;
pub mod error;
pub mod output;

pub use engine::render;
pub use error::{RenderError, RenderResult};
pub use output::{write_atomic, ConfigRenderer};
