//! IO modules - the engine's boundary with its host
//!
//! This module contains the port traits and the adapters the player uses:
//! - `ports` - animation, id resolution and presentation traits
//! - `simulated_camera` - camera that flies by sleeping
//! - `static_resolver` - id resolution from a fixed table
//! - `log_presentation` - presentation narrated into the log
//! - `console` - stdin control of a running tour
//! - `tour_file` - loading tour definitions from JSON or TOML

pub mod console;
pub mod log_presentation;
pub mod ports;
pub mod simulated_camera;
pub mod static_resolver;
pub mod tour_file;

// Re-export commonly used types
pub use ports::{AnimationPort, IdResolver, NullPresentation, Presentation};
pub use simulated_camera::SimulatedCamera;
pub use static_resolver::StaticResolver;
