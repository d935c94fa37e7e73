//! External collaborators: where they live, how they are started, and the
//! dependency probe that runs before a pipeline touches anything.

pub mod apktool;
pub mod deps;
pub mod java;
pub mod locate;
pub mod process;

pub use apktool::Apktool;
pub use deps::{probe_android, AndroidToolchain};
pub use java::{parse_java_major, JavaRuntime};
pub use locate::ToolLocator;
pub use process::{Captured, ToolCommand};
