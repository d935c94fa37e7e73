//! CLI command handlers, one file per command.

mod check_deps;
mod checksum;
mod completions;
mod patch;

pub use check_deps::run_check_deps;
pub use checksum::run_checksum;
pub use completions::{run_completions, run_man};
pub use patch::run_patch;
