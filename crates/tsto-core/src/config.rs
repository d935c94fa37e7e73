use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::endpoints::{Endpoints, UrlMapping, DLC_SUFFIX};
use crate::rewrite::{BinarySlot, PadStyle};

/// Where external tools are searched for and how long they may take to start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Directories probed first, relative to the working directory.
    pub search_roots: Vec<PathBuf>,
    /// Environment variable naming one more tools directory.
    pub env_hint: String,
    /// Seconds a subprocess may take to start before the run fails.
    pub startup_timeout_secs: u64,
    /// Lowest accepted Java major version.
    pub java_min_version: u32,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            search_roots: vec!["sdktools".into(), "build/sdktools".into()],
            env_hint: "TSTO_SDKTOOLS".to_string(),
            startup_timeout_secs: 30,
            java_min_version: 11,
        }
    }
}

impl ToolsConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}

/// Debug keystore used to re-sign APKs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    pub keystore: String,
    pub key_alias: String,
    pub store_password: String,
    pub key_password: String,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            keystore: "debug.keystore".to_string(),
            key_alias: "androiddebugkey".to_string(),
            store_password: "android".to_string(),
            key_password: "android".to_string(),
        }
    }
}

/// Extracted-tree directory names and the output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub apk_dir: String,
    pub ipa_dir: String,
    /// Parent of the extracted trees; `None` = working directory.
    pub work_dir: Option<PathBuf>,
    /// Where patched artifacts land; `None` = working directory.
    pub output_dir: Option<PathBuf>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            apk_dir: "tappedout".to_string(),
            ipa_dir: "decipa".to_string(),
            work_dir: None,
            output_dir: None,
        }
    }
}

/// Original URL constants shipped in the client and the text allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlConfig {
    /// Literals in text resources that all point at the game server.
    pub text_game_urls: Vec<String>,
    /// CDN constant compiled into native code; its path matters to the client.
    pub dlc_literal: String,
    /// Director URL compiled into the iOS executable.
    pub game_literal: String,
    pub text_extensions: Vec<String>,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            text_game_urls: vec![
                "https://prod.simpsons-ea.com".to_string(),
                "https://syn-dir.sn.eamobile.com".to_string(),
            ],
            dlc_literal:
                "http://oct2018-4-35-0-uam5h44a.tstodlc.eamobile.com/netstorage/gameasset/direct/simpsons/"
                    .to_string(),
            game_literal: "https://syn-dir.sn.eamobile.com".to_string(),
            text_extensions: vec![".xml".into(), ".smali".into(), ".txt".into()],
        }
    }
}

impl UrlConfig {
    /// Every text literal mapped to the game endpoint, in configured order.
    pub fn text_mapping(&self, endpoints: &Endpoints) -> UrlMapping {
        self.text_game_urls
            .iter()
            .map(|u| (u.clone(), endpoints.game().to_string()))
            .collect()
    }

    pub fn dlc_slot(&self, endpoints: &Endpoints) -> BinarySlot {
        BinarySlot::new(
            "DLC URL",
            self.dlc_literal.as_bytes(),
            endpoints.dlc(),
            DLC_SUFFIX,
            PadStyle::PathSegments,
        )
    }

    pub fn game_slot(&self, endpoints: &Endpoints) -> BinarySlot {
        BinarySlot::new(
            "Game server URL",
            self.game_literal.as_bytes(),
            endpoints.game(),
            "",
            PadStyle::TrailingSlashes,
        )
    }
}

/// Global configuration loaded from `~/.config/tsto-patcher/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatcherConfig {
    pub tools: ToolsConfig,
    pub signing: SigningConfig,
    pub workspace: WorkspaceConfig,
    pub urls: UrlConfig,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("tsto-patcher")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PatcherConfig> {
    let path = config_path()?;
    load_or_init_at(&path)
}

pub fn load_or_init_at(path: &Path) -> Result<PatcherConfig> {
    if !path.exists() {
        let default_cfg = PatcherConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml).with_context(|| format!("write config: {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path).with_context(|| format!("read config: {}", path.display()))?;
    let cfg: PatcherConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}
