use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::mapping::MappingSpec;
use crate::infrastructure::ProviderConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub rpc: Option<String>,
    pub ws: Option<String>,
    pub ipc: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub networks: Vec<NetworkConfig>,

    pub default_network: Option<String>,

    /// Artifact paths, directories or wildcard patterns
    #[serde(default)]
    pub contracts: Vec<String>,

    pub working_dir: Option<PathBuf>,

    pub concurrency: Option<usize>,

    pub call_timeout_ms: Option<u64>,

    #[serde(default)]
    pub mapping: MappingSpec,
}

impl NetworkConfig {
    /// First configured endpoint, preferring rpc over ws over ipc
    pub fn provider_config(&self) -> Option<ProviderConfig> {
        if let Some(rpc) = non_empty(&self.rpc) {
            return Some(ProviderConfig::Http(rpc));
        }
        if let Some(ws) = non_empty(&self.ws) {
            return Some(ProviderConfig::WebSocket(ws));
        }
        #[cfg(unix)]
        {
            if let Some(ipc) = non_empty(&self.ipc) {
                return Some(ProviderConfig::Ipc(PathBuf::from(ipc)));
            }
        }
        None
    }
}

impl Config {
    pub fn network(&self, name: &str) -> Option<&NetworkConfig> {
        self.networks.iter().find(|network| network.name == name)
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
    match toml::from_str::<Config>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %path.display(), "ignoring invalid config: {}", err);
            Config::default()
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("CONTRACT_MAPPER_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("contract-mapper").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("contract-mapper").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "contract-mapper", "contract-mapper")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
