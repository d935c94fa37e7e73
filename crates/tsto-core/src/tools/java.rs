//! Java runtime discovery: version check, JAVA_HOME, jarsigner.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use super::locate::{executable_in, find_in_path, ToolLocator};
use super::process::ToolCommand;
use crate::error::{PatchError, PatchResult};
use crate::observer::Reporter;

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"version "(\d+)(?:\.(\d+))?"#).expect("static pattern"))
}

/// Major version from `java -version` output. Legacy `1.x` numbering maps to
/// `x` (`1.8.0_292` → 8).
pub fn parse_java_major(output: &str) -> Option<u32> {
    let caps = version_regex().captures(output)?;
    let first: u32 = caps.get(1)?.as_str().parse().ok()?;
    if first == 1 {
        return caps.get(2)?.as_str().parse().ok();
    }
    Some(first)
}

/// A usable Java installation and the environment children should run with.
#[derive(Debug, Clone)]
pub struct JavaRuntime {
    pub java: PathBuf,
    pub major: u32,
    /// `JAVA_HOME`, from the environment or derived from `java`'s location.
    pub home: Option<PathBuf>,
}

impl JavaRuntime {
    /// `java` from PATH, checked against `min_major`.
    pub fn probe(min_major: u32, timeout: Duration, reporter: &mut Reporter<'_>) -> PatchResult<Self> {
        let java = find_in_path("java").ok_or_else(|| PatchError::DependencyMissing {
            what: "Java".to_string(),
            hint: format!("install a Java SDK (version {min_major} or higher) and put it on PATH"),
        })?;
        let out = ToolCommand::new("java", &java).arg("-version").capture(timeout)?;
        let major = parse_java_major(&out.combined()).ok_or_else(|| PatchError::DependencyMissing {
            what: "Java".to_string(),
            hint: format!(
                "could not determine Java version; ensure Java SDK {min_major} or higher is installed"
            ),
        })?;
        reporter.log(format!("Found Java version: {major}"));
        if major < min_major {
            return Err(PatchError::DependencyMissing {
                what: format!("Java {min_major}+"),
                hint: format!("found Java {major}; install Java SDK {min_major} or higher"),
            });
        }

        let home = match env::var_os("JAVA_HOME").filter(|v| !v.is_empty()) {
            Some(h) => {
                reporter.log(format!("JAVA_HOME is set to: {}", Path::new(&h).display()));
                Some(PathBuf::from(h))
            }
            None => {
                let derived = derive_java_home(&java);
                reporter.warn("JAVA_HOME environment variable is not set");
                if let Some(h) = &derived {
                    reporter.log(format!("Using JAVA_HOME derived from java: {}", h.display()));
                }
                derived
            }
        };
        Ok(Self { java, major, home })
    }

    /// Environment for Java children: `JAVA_HOME` plus a PATH led by its bin dir.
    pub fn child_env(&self) -> Vec<(OsString, OsString)> {
        let Some(home) = &self.home else {
            return Vec::new();
        };
        let mut paths = vec![home.join("bin")];
        if let Some(existing) = env::var_os("PATH") {
            paths.extend(env::split_paths(&existing));
        }
        let mut vars = vec![(OsString::from("JAVA_HOME"), home.as_os_str().to_os_string())];
        if let Ok(joined) = env::join_paths(paths) {
            vars.push((OsString::from("PATH"), joined));
        }
        vars
    }

    /// Finds `jarsigner`: PATH, `JAVA_HOME/bin`, beside `java`, common JDK
    /// locations, then a bundled copy. Anything but PATH logs a warning.
    pub fn find_jarsigner(&self, locator: &ToolLocator, reporter: &mut Reporter<'_>) -> PatchResult<PathBuf> {
        if let Some(p) = find_in_path("jarsigner") {
            return Ok(p);
        }
        reporter.warn("jarsigner not found in PATH. Will attempt to find it in other locations.");

        let mut dirs: Vec<PathBuf> = Vec::new();
        if let Some(home) = &self.home {
            dirs.push(home.join("bin"));
        }
        if let Some(bin) = self.java.parent() {
            dirs.push(bin.to_path_buf());
        }
        dirs.extend(common_jdk_bins());

        let bundled = format!("jdk/bin/jarsigner{}", env::consts::EXE_SUFFIX);
        let found = dirs
            .iter()
            .find_map(|d| executable_in(d, "jarsigner"))
            .or_else(|| locator.find_file(&bundled));
        match found {
            Some(p) => {
                reporter.log(format!("Found jarsigner at: {}", p.display()));
                Ok(p)
            }
            None => Err(PatchError::DependencyMissing {
                what: "jarsigner".to_string(),
                hint: "install a full JDK (not just a JRE) or set JAVA_HOME".to_string(),
            }),
        }
    }
}

/// `<home>/bin/java` → `<home>`, following symlinks such as
/// `/usr/bin/java` → `/usr/lib/jvm/.../bin/java`.
pub fn derive_java_home(java: &Path) -> Option<PathBuf> {
    let real = java.canonicalize().unwrap_or_else(|_| java.to_path_buf());
    let bin = real.parent()?;
    if bin.file_name()? != "bin" {
        return None;
    }
    bin.parent().map(Path::to_path_buf)
}

fn common_jdk_bins() -> Vec<PathBuf> {
    let parents: &[&str] = if cfg!(windows) {
        &["C:/Program Files/Java", "C:/Program Files/Eclipse Adoptium"]
    } else if cfg!(target_os = "macos") {
        &["/Library/Java/JavaVirtualMachines"]
    } else {
        &["/usr/lib/jvm"]
    };
    let mut bins = Vec::new();
    for parent in parents {
        let Ok(entries) = std::fs::read_dir(parent) else {
            continue;
        };
        let mut jdks: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
        jdks.sort();
        for jdk in jdks.into_iter().rev() {
            bins.push(jdk.join("bin"));
            bins.push(jdk.join("Contents/Home/bin"));
        }
    }
    bins
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modern_and_legacy_versions() {
        assert_eq!(parse_java_major(r#"openjdk version "17.0.2" 2022-01-18"#), Some(17));
        assert_eq!(parse_java_major(r#"java version "1.8.0_292""#), Some(8));
        assert_eq!(parse_java_major(r#"openjdk version "21" 2023-09-19"#), Some(21));
        assert_eq!(parse_java_major("command not found"), None);
    }

    #[test]
    fn java_home_from_bin_layout() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("jdk-17/bin");
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(bin.join("java"), b"").unwrap();
        let home = derive_java_home(&bin.join("java")).unwrap();
        assert!(home.ends_with("jdk-17"));
        assert_eq!(derive_java_home(Path::new("/java")), None);
    }

    #[test]
    fn child_env_leads_path_with_java_bin() {
        let rt = JavaRuntime {
            java: PathBuf::from("/opt/jdk/bin/java"),
            major: 17,
            home: Some(PathBuf::from("/opt/jdk")),
        };
        let vars = rt.child_env();
        assert_eq!(vars[0], (OsString::from("JAVA_HOME"), OsString::from("/opt/jdk")));
        let path = &vars[1].1;
        let first = env::split_paths(path).next().unwrap();
        assert_eq!(first, PathBuf::from("/opt/jdk/bin"));

        let no_home = JavaRuntime { home: None, ..rt };
        assert!(no_home.child_env().is_empty());
    }
}
