//! CLI configuration.
//!
//! Reads `~/.config/coreup/config.json`. A value set in the file wins;
//! anything missing falls back to the `COREUP_*` environment variables
//! and then to the built-in defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_URL: &str = "ws://my.wamp.dnp.dappnode.eth:8080/ws";
pub const DEFAULT_REALM: &str = "dappnode_admin";
pub const DEFAULT_SERVICE: &str = "dappmanager.dnp.dappnode.eth";
pub const DEFAULT_PACKAGE: &str = "core.dnp.dappnode.eth";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    url: String,
    #[serde(default)]
    realm: String,
    #[serde(default)]
    service: String,
    #[serde(default)]
    package: String,
}

/// Where to connect and what to update.
#[derive(Debug, Clone)]
pub struct Config {
    pub url: String,
    pub realm: String,
    pub service: String,
    pub package: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.into(),
            realm: DEFAULT_REALM.into(),
            service: DEFAULT_SERVICE.into(),
            package: DEFAULT_PACKAGE.into(),
        }
    }
}

impl Config {
    /// Loads configuration: file, then environment, then defaults.
    pub fn load() -> anyhow::Result<Self> {
        let mut file = ConfigFile::default();

        let path = config_path()?;
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<ConfigFile>(&content) {
                Ok(parsed) => file = parsed,
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config, using defaults"
                ),
            }
        }

        Ok(Self {
            url: pick(file.url, "COREUP_URL", DEFAULT_URL),
            realm: pick(file.realm, "COREUP_REALM", DEFAULT_REALM),
            service: pick(file.service, "COREUP_SERVICE", DEFAULT_SERVICE),
            package: pick(file.package, "COREUP_PACKAGE", DEFAULT_PACKAGE),
        })
    }
}

fn pick(from_file: String, env_var: &str, default: &str) -> String {
    if !from_file.is_empty() {
        return from_file;
    }
    match std::env::var(env_var) {
        Ok(v) if !v.is_empty() => v,
        _ => default.into(),
    }
}

fn config_path() -> anyhow::Result<PathBuf> {
    let config_dir = config_base_dir()?;
    Ok(config_dir.join("coreup").join("config.json"))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home).join(".config"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_value_wins_over_default() {
        assert_eq!(
            pick("ws://router:9000/ws".into(), "COREUP_TEST_UNSET", "d"),
            "ws://router:9000/ws"
        );
    }

    #[test]
    fn empty_file_value_falls_back_to_default() {
        assert_eq!(pick(String::new(), "COREUP_TEST_UNSET", "fallback"), "fallback");
    }
}
