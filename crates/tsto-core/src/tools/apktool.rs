//! APK collaborator: apktool for decode/build, jarsigner for signing.

use std::path::Path;
use std::time::Duration;

use super::deps::{probe_android, AndroidToolchain};
use super::process::ToolCommand;
use crate::config::{SigningConfig, ToolsConfig};
use crate::endpoints::Endpoints;
use crate::error::{PatchError, PatchResult};
use crate::observer::Reporter;
use crate::pipeline::PackageTool;

#[derive(Debug, Clone)]
pub struct Apktool {
    tools: ToolsConfig,
    signing: SigningConfig,
    toolchain: Option<AndroidToolchain>,
}

impl Apktool {
    pub fn new(tools: ToolsConfig, signing: SigningConfig) -> Self {
        Self {
            tools,
            signing,
            toolchain: None,
        }
    }

    /// Uses an already probed toolchain; `check` then does nothing.
    pub fn with_toolchain(tools: ToolsConfig, signing: SigningConfig, toolchain: AndroidToolchain) -> Self {
        Self {
            tools,
            signing,
            toolchain: Some(toolchain),
        }
    }

    fn toolchain(&self) -> PatchResult<&AndroidToolchain> {
        self.toolchain.as_ref().ok_or_else(|| PatchError::DependencyMissing {
            what: "android toolchain".to_string(),
            hint: "dependency check did not run".to_string(),
        })
    }

    fn timeout(&self) -> Duration {
        self.tools.startup_timeout()
    }

    pub fn decode_command(&self, package: &Path, tree: &Path, endpoints: &Endpoints) -> PatchResult<ToolCommand> {
        let tc = self.toolchain()?;
        Ok(ToolCommand::new("apktool decode", &tc.java.java)
            .arg("-jar")
            .arg(&tc.apktool_jar)
            .arg("d")
            .arg(package)
            .arg("-f")
            .arg("-o")
            .arg(tree)
            .envs(tc.child_env())
            .env("SOURCE_OUTPUT", tree)
            .env("APK_FILE", package)
            .env("DLC_URL", endpoints.dlc())
            .env("GAMESERVER_URL", endpoints.game())
            .env("DIRECTOR_URL", endpoints.game()))
    }

    pub fn build_command(&self, tree: &Path, artifact: &Path) -> PatchResult<ToolCommand> {
        let tc = self.toolchain()?;
        Ok(ToolCommand::new("apktool build", &tc.java.java)
            .arg("-jar")
            .arg(&tc.apktool_jar)
            .arg("b")
            .arg(tree)
            .arg("-o")
            .arg(artifact)
            .envs(tc.child_env()))
    }

    pub fn sign_command(&self, artifact: &Path) -> PatchResult<ToolCommand> {
        let tc = self.toolchain()?;
        let s = &self.signing;
        Ok(ToolCommand::new("jarsigner", &tc.jarsigner)
            .arg("-verbose")
            .arg("-keystore")
            .arg(&tc.keystore)
            .arg("-storepass")
            .arg(&s.store_password)
            .arg("-keypass")
            .arg(&s.key_password)
            .arg(artifact)
            .arg(&s.key_alias)
            .secret(s.store_password.clone())
            .secret(s.key_password.clone())
            .envs(tc.child_env()))
    }
}

impl PackageTool for Apktool {
    fn name(&self) -> &str {
        "apktool"
    }

    fn check(&mut self, reporter: &mut Reporter<'_>) -> PatchResult<()> {
        if self.toolchain.is_none() {
            self.toolchain = Some(probe_android(&self.tools, &self.signing, reporter)?);
        }
        reporter.log("Dependencies verified successfully!");
        Ok(())
    }

    fn decompile(
        &mut self,
        package: &Path,
        tree: &Path,
        endpoints: &Endpoints,
        reporter: &mut Reporter<'_>,
    ) -> PatchResult<()> {
        self.decode_command(package, tree, endpoints)?
            .run(self.timeout(), reporter)
    }

    fn recompile(&mut self, tree: &Path, artifact: &Path, reporter: &mut Reporter<'_>) -> PatchResult<()> {
        self.build_command(tree, artifact)?.run(self.timeout(), reporter)
    }

    fn sign(&mut self, artifact: &Path, reporter: &mut Reporter<'_>) -> PatchResult<bool> {
        let tc = self.toolchain()?;
        reporter.log(format!("Using keystore: {}", tc.keystore.display()));
        self.sign_command(artifact)?.run(self.timeout(), reporter)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::java::JavaRuntime;
    use std::path::PathBuf;

    fn apktool() -> Apktool {
        let tc = AndroidToolchain {
            java: JavaRuntime {
                java: PathBuf::from("/jdk/bin/java"),
                major: 17,
                home: None,
            },
            apktool_jar: PathBuf::from("sdktools/apktool/apktool_2.10.0.jar"),
            jarsigner: PathBuf::from("/jdk/bin/jarsigner"),
            keystore: PathBuf::from("sdktools/debug.keystore"),
        };
        Apktool::with_toolchain(ToolsConfig::default(), SigningConfig::default(), tc)
    }

    #[test]
    fn decode_passes_endpoints_through_env() {
        let ep = Endpoints::new("https://api.example.com/", "http://cdn.example.com").unwrap();
        let cmd = apktool()
            .decode_command(Path::new("game.apk"), Path::new("tappedout"), &ep)
            .unwrap();
        assert_eq!(
            cmd.display(),
            "/jdk/bin/java -jar sdktools/apktool/apktool_2.10.0.jar d game.apk -f -o tappedout"
        );
        assert_eq!(cmd.env_value("DLC_URL").unwrap(), "http://cdn.example.com");
        assert_eq!(cmd.env_value("DIRECTOR_URL").unwrap(), "https://api.example.com");
        assert_eq!(cmd.env_value("SOURCE_OUTPUT").unwrap(), "tappedout");
    }

    #[test]
    fn sign_masks_passwords() {
        let cmd = apktool().sign_command(Path::new("out.apk.part")).unwrap();
        assert_eq!(
            cmd.display(),
            "/jdk/bin/jarsigner -verbose -keystore sdktools/debug.keystore -storepass **** -keypass **** out.apk.part androiddebugkey"
        );
    }

    #[test]
    fn commands_need_a_checked_toolchain() {
        let tool = Apktool::new(ToolsConfig::default(), SigningConfig::default());
        let err = tool.build_command(Path::new("t"), Path::new("o")).unwrap_err();
        assert!(matches!(err, PatchError::DependencyMissing { .. }));
    }
}
