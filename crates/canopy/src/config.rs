//! Configuration for canopy.
//!
//! Settings come from CLI flags merged over an optional project-local
//! `canopy.toml`; the result is one resolved [`Config`] constructed at
//! startup and passed into each component. There is no global options
//! singleton.
//!
//! Example canopy.toml:
//! ```toml
//! port = 8080
//! root = "samples"          # language files to view
//! lua = "lua5.4"            # parser runtime
//! main = "parser/main.lua"  # parser entry script
//! entry = "chunk"           # default entry rule
//! log = true                # forward parser diagnostics
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "canopy.toml";

/// Raw `canopy.toml` contents; every field optional so the CLI can override.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CanopyConfig {
    pub port: Option<u16>,
    pub root: Option<PathBuf>,
    pub lua: Option<PathBuf>,
    pub main: Option<PathBuf>,
    pub entry: Option<String>,
    pub assets: Option<PathBuf>,
    pub log: Option<bool>,
}

impl CanopyConfig {
    /// Load `<dir>/canopy.toml` if it exists. A malformed file is logged and
    /// ignored; only the CLI can fail startup.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        let Ok(text) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        match toml::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("ignoring malformed {}: {e}", path.display());
                Self::default()
            }
        }
    }
}

/// Fully resolved settings, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on; 0 asks the OS for a free port.
    pub port: u16,
    /// Root directory of the language files to view.
    pub root: PathBuf,
    /// Lua executable that runs the parser.
    pub lua: PathBuf,
    /// Main parser script.
    pub main: PathBuf,
    /// Default entry rule when a request names none.
    pub entry: Option<String>,
    /// Directory the viewer's static assets are served from.
    pub assets: PathBuf,
    /// Whether parser diagnostics are forwarded to the console.
    pub log: bool,
    /// Hard bound on one parser invocation.
    pub timeout: Duration,
}

/// CLI-shaped inputs to [`Config::resolve`]; `None` falls back to the file
/// value, then the default.
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub root: Option<PathBuf>,
    pub lua: Option<PathBuf>,
    pub main: Option<PathBuf>,
    pub entry: Option<String>,
    pub assets: Option<PathBuf>,
    pub log: bool,
}

impl Config {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Merge CLI overrides onto file values and validate. `lua` and `main`
    /// are required; a missing one is a startup error, reported before any
    /// listener opens.
    pub fn resolve(cli: ConfigOverrides, file: CanopyConfig) -> Result<Self, String> {
        let lua = cli
            .lua
            .or(file.lua)
            .ok_or("no Lua runtime specified (--lua)")?;
        let main = cli
            .main
            .or(file.main)
            .ok_or("no parser script specified (--main)")?;

        Ok(Config {
            port: cli.port.or(file.port).unwrap_or(0),
            root: cli.root.or(file.root).unwrap_or_else(|| PathBuf::from(".")),
            lua,
            main,
            entry: cli.entry.or(file.entry),
            assets: cli.assets.or(file.assets).unwrap_or_else(default_assets),
            log: cli.log || file.log.unwrap_or(false),
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }
}

/// Default assets location: an `assets` directory next to the executable,
/// falling back to `./assets` during development.
fn default_assets() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let assets = dir.join("assets");
            if assets.is_dir() {
                return assets;
            }
        }
    }
    PathBuf::from("assets")
}
