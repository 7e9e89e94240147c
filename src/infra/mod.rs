//! Infrastructure - configuration, metrics and diagnostics
//!
//! This module contains infrastructure concerns:
//! - `config` - Player configuration (TOML loading, defaults)
//! - `metrics` - Lock-free metrics collection
//! - `diagnostics` - Structured tour diagnostics

pub mod config;
pub mod diagnostics;
pub mod metrics;

// Re-export commonly used types
pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticSink, NoopDiagnostics, TracingDiagnostics};
pub use metrics::Metrics;
