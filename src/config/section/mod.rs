//! Configuration section definitions.

mod build;
mod compiler;
mod serve;
mod watch;

pub use build::BuildSectionConfig;
pub use compiler::{CompilerConfig, ValidationLevel};
pub use serve::ServeConfig;
pub use watch::WatchConfig;
