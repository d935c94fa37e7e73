//! Shared fixtures for integration tests: package layouts with the shipped
//! URL constants embedded, and a scripted stand-in for apktool.
#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tsto_core::archive::create_archive;
use tsto_core::config::WorkspaceConfig;
use tsto_core::{Endpoints, PackageTool, PatchError, PatchRequest, PatchResult, Reporter, TargetKind};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub const DLC_LITERAL: &str =
    "http://oct2018-4-35-0-uam5h44a.tstodlc.eamobile.com/netstorage/gameasset/direct/simpsons/";
pub const GAME_LITERAL: &str = "https://syn-dir.sn.eamobile.com";
pub const TEXT_LITERAL: &str = "https://prod.simpsons-ea.com";

pub const INFO_PLIST: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<plist version=\"1.0\">
<dict>
\t<key>CFBundleExecutable</key>
\t<string>Tapped Out</string>
\t<key>CFBundleVersion</key>
\t<string>4.69.5</string>
</dict>
</plist>
";

/// Machine-code-looking bytes with `literals` embedded, NUL-terminated.
pub fn binary_with(literals: &[&str]) -> Vec<u8> {
    let mut out = vec![0xcf, 0xfa, 0xed, 0xfe, 0x0c, 0x00, 0x00, 0x01];
    out.extend(std::iter::repeat(0x90).take(256));
    for lit in literals {
        out.extend_from_slice(lit.as_bytes());
        out.push(0);
        out.extend(std::iter::repeat(0xab).take(64));
    }
    out
}

/// Writes an IPA whose bundle holds `Info.plist` and a main executable.
pub fn write_ipa(path: &Path, plist: &str, executable: &[u8]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let opts = SimpleFileOptions::default().unix_permissions(0o644);
    zip.add_directory("Payload/", opts).unwrap();
    zip.add_directory("Payload/Tapped Out.app/", opts).unwrap();
    zip.start_file("Payload/Tapped Out.app/Info.plist", opts).unwrap();
    zip.write_all(plist.as_bytes()).unwrap();
    zip.start_file(
        "Payload/Tapped Out.app/Tapped Out",
        SimpleFileOptions::default().unix_permissions(0o755),
    )
    .unwrap();
    zip.write_all(executable).unwrap();
    zip.finish().unwrap();
}

pub fn request(kind: TargetKind, package: &Path, work: &Path, game: &str, dlc: &str) -> PatchRequest {
    let ws = WorkspaceConfig {
        work_dir: Some(work.to_path_buf()),
        output_dir: Some(work.join("out")),
        ..WorkspaceConfig::default()
    };
    PatchRequest::new(kind, package, Endpoints::new(game, dlc).unwrap(), &ws)
}

/// Which call a `FakeApkTool` should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Nothing,
    Check,
    Recompile,
    Sign,
}

/// Stands in for apktool: "decodes" into a fixed tree and "builds" by zipping it.
#[derive(Debug)]
pub struct FakeApkTool {
    pub fail_at: FailAt,
    pub calls: Vec<&'static str>,
    pub decompiled_into: Option<PathBuf>,
}

impl FakeApkTool {
    pub fn new(fail_at: FailAt) -> Self {
        Self {
            fail_at,
            calls: Vec::new(),
            decompiled_into: None,
        }
    }

    fn failure(&self, what: &str) -> PatchError {
        PatchError::SubprocessFailed {
            tool: "fake-apktool".to_string(),
            reason: format!("{what} exited with code 1"),
        }
    }
}

impl PackageTool for FakeApkTool {
    fn name(&self) -> &str {
        "fake-apktool"
    }

    fn check(&mut self, reporter: &mut Reporter<'_>) -> PatchResult<()> {
        self.calls.push("check");
        if self.fail_at == FailAt::Check {
            return Err(PatchError::DependencyMissing {
                what: "apktool.jar".to_string(),
                hint: "searched nowhere".to_string(),
            });
        }
        reporter.log("fake toolchain ready");
        Ok(())
    }

    fn decompile(
        &mut self,
        _package: &Path,
        tree: &Path,
        endpoints: &Endpoints,
        reporter: &mut Reporter<'_>,
    ) -> PatchResult<()> {
        self.calls.push("decompile");
        reporter.log(format!("I: decoding with DLC_URL={}", endpoints.dlc()));
        fs::write(
            tree.join("AndroidManifest.xml"),
            format!("<manifest><meta-data android:value=\"{TEXT_LITERAL}/config\"/></manifest>"),
        )
        .unwrap();
        let smali = tree.join("smali/com/ea/game");
        fs::create_dir_all(&smali).unwrap();
        fs::write(
            smali.join("Director.smali"),
            format!("const-string v0, \"{GAME_LITERAL}/director/api\"\n"),
        )
        .unwrap();
        fs::write(smali.join("Untouched.smali"), "return-void\n").unwrap();
        let lib = tree.join("lib/arm64-v8a");
        fs::create_dir_all(&lib).unwrap();
        fs::write(lib.join("libscorpio.so"), binary_with(&[DLC_LITERAL])).unwrap();
        fs::write(lib.join("libcrash.so"), binary_with(&[])).unwrap();
        self.decompiled_into = Some(tree.to_path_buf());
        Ok(())
    }

    fn recompile(&mut self, tree: &Path, artifact: &Path, reporter: &mut Reporter<'_>) -> PatchResult<()> {
        self.calls.push("recompile");
        if self.fail_at == FailAt::Recompile {
            fs::write(artifact, b"half-written").unwrap();
            return Err(self.failure("apktool b"));
        }
        create_archive(tree, artifact, reporter)?;
        Ok(())
    }

    fn sign(&mut self, _artifact: &Path, reporter: &mut Reporter<'_>) -> PatchResult<bool> {
        self.calls.push("sign");
        if self.fail_at == FailAt::Sign {
            return Err(self.failure("jarsigner"));
        }
        reporter.log("jar signed.");
        Ok(true)
    }
}
