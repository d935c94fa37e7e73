//! Pre-flight probe for the Android toolchain.

use std::ffi::OsString;
use std::path::PathBuf;

use super::java::JavaRuntime;
use super::locate::ToolLocator;
use crate::config::{SigningConfig, ToolsConfig};
use crate::error::PatchResult;
use crate::observer::Reporter;

/// Everything the APK pipeline runs, resolved to absolute paths.
#[derive(Debug, Clone)]
pub struct AndroidToolchain {
    pub java: JavaRuntime,
    pub apktool_jar: PathBuf,
    pub jarsigner: PathBuf,
    pub keystore: PathBuf,
}

impl AndroidToolchain {
    pub fn child_env(&self) -> Vec<(OsString, OsString)> {
        self.java.child_env()
    }
}

/// Resolves apktool, the debug keystore, Java and jarsigner, in that order.
/// The first missing element fails the probe with `DependencyMissing`.
pub fn probe_android(
    tools: &ToolsConfig,
    signing: &SigningConfig,
    reporter: &mut Reporter<'_>,
) -> PatchResult<AndroidToolchain> {
    let locator = ToolLocator::from_config(tools);
    probe_android_with(&locator, tools, signing, reporter)
}

pub fn probe_android_with(
    locator: &ToolLocator,
    tools: &ToolsConfig,
    signing: &SigningConfig,
    reporter: &mut Reporter<'_>,
) -> PatchResult<AndroidToolchain> {
    let apktool_jar = locator.require_with_extension("apktool", "jar", "apktool.jar")?;
    reporter.log(format!("Found apktool.jar at: {}", apktool_jar.display()));

    let keystore = locator.require_file(&signing.keystore, "debug keystore")?;
    reporter.log(format!("Found debug.keystore at: {}", keystore.display()));

    let java = JavaRuntime::probe(tools.java_min_version, tools.startup_timeout(), reporter)?;
    let jarsigner = java.find_jarsigner(locator, reporter)?;
    tracing::debug!(
        apktool = %apktool_jar.display(),
        keystore = %keystore.display(),
        java = %java.java.display(),
        jarsigner = %jarsigner.display(),
        "android toolchain resolved"
    );
    Ok(AndroidToolchain {
        java,
        apktool_jar,
        jarsigner,
        keystore,
    })
}
