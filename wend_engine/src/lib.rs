#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub const WEND_VERSION: &str = env!("CARGO_PKG_VERSION");

// Core modules
pub mod context;
pub mod executor;
pub mod id;
pub mod loader;
pub mod registry;
pub mod table;
pub mod transition;

// Re-exports for convenience
pub use context::{ActionContext, ContextError};
pub use executor::{ExecuteError, Executor};
pub use id::{MapId, NodeId};
pub use loader::{DataIssue, LoadError, LoadedMaps, load_file, load_str};
pub use registry::{LookupError, MapNode, MapRegistry, NodeInfo};
pub use table::WaytoTable;
pub use transition::{Compass, Direction, Transition};
