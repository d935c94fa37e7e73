pub mod config;
pub mod logging;

pub mod archive;
pub mod checksum;
pub mod classify;
pub mod endpoints;
pub mod error;
pub mod locator;
pub mod observer;
pub mod pipeline;
pub mod report;
pub mod rewrite;
pub mod storage;
pub mod tools;

pub use endpoints::{Endpoints, UrlMapping};
pub use error::{PatchError, PatchResult};
pub use observer::{PatchObserver, RecordingObserver, Reporter, SilentObserver};
pub use pipeline::{patch_apk, patch_ipa, PackageTool, PatchRequest, TargetKind};
pub use report::RunReport;
