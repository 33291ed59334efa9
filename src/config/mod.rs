use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

/// Keyboards contract deployment used when nothing else is configured
pub const DEFAULT_CONTRACT: &str = "0xefF7380A098C01430d12B9864462bB16443eEb4a";
pub const DEFAULT_TIP_AMOUNT: &str = "0.01";
pub const DEFAULT_LOG_LEVEL: &str = "keyboards=info,warn";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConfig {
    pub name: Option<String>,
    pub rpc: Option<String>,
    pub ipc: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wallet: Option<WalletConfig>,

    pub contract: Option<String>,

    /// Ether amount attached to each tip
    pub tip_amount: Option<String>,

    pub log_level: Option<String>,
}

impl Config {
    pub fn contract(&self) -> &str {
        self.contract
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_CONTRACT)
    }

    pub fn tip_amount(&self) -> &str {
        self.tip_amount
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_TIP_AMOUNT)
    }

    pub fn log_level(&self) -> &str {
        self.log_level
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

impl WalletConfig {
    pub fn label(&self) -> Option<String> {
        self.name.clone().filter(|name| !name.trim().is_empty())
    }
}

pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    parse(&content)
}

pub fn parse(content: &str) -> Config {
    toml::from_str::<Config>(content).unwrap_or_default()
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("KEYBOARDS_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("keyboards").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("keyboards").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "keyboards", "keyboards")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("keyboards"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("keyboards"));
    }
    directories::ProjectDirs::from("io", "keyboards", "keyboards")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn log_dir() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = parse("");
        assert!(config.wallet.is_none());
        assert_eq!(config.contract(), DEFAULT_CONTRACT);
        assert_eq!(config.tip_amount(), "0.01");
        assert_eq!(config.log_level(), DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_parse_full_file() {
        let config = parse(
            r#"
            contract = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            tip_amount = "0.05"
            log_level = "debug"

            [wallet]
            name = "anvil"
            rpc = "ws://127.0.0.1:8545"
            "#,
        );
        let wallet = config.wallet.clone().expect("wallet section");
        assert_eq!(wallet.label().as_deref(), Some("anvil"));
        assert_eq!(wallet.rpc.as_deref(), Some("ws://127.0.0.1:8545"));
        assert_eq!(config.contract(), "0x5FbDB2315678afecb367f032d93F642f64180aa3");
        assert_eq!(config.tip_amount(), "0.05");
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let config = parse("contract = [");
        assert_eq!(config.contract(), DEFAULT_CONTRACT);
    }
}
