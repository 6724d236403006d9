//! Service layer
//!
//! `ReleaseTreeService` is the public entry point: it checks access, resolves
//! the Release and data plane from the control plane, and reads live state
//! through the gateway. Nothing is cached between calls.

pub mod events;
pub mod logs;
pub mod release_tree;

pub use events::EventTarget;
pub use logs::parse_log_lines;
pub use release_tree::{ReleaseTreeService, ResolvedRelease};
