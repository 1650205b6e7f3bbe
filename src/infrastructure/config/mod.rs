use crate::domain::error::Result;
use crate::domain::llm_config::LLMConfig;
use crate::infrastructure::security::keyring::KeyringManager;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

const ENV_PREFIX: &str = "BUG_INTAKE_";
const CONFIG_PATH_VAR: &str = "BUG_INTAKE_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "bug-intake.toml";
const KEYRING_SERVICE: &str = "BugIntake";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Idle wizard sessions older than this are dropped.
    pub session_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            session_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LLMConfig,
    pub server: ServerConfig,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LLMConfig::default(),
            server: ServerConfig::default(),
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the TOML file, then `BUG_INTAKE_*` variables (`__` separates sections).
    pub fn figment(path: Option<PathBuf>) -> Figment {
        let path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

pub struct ConfigService {
    keyring: KeyringManager,
}

impl ConfigService {
    pub fn new() -> Self {
        Self {
            keyring: KeyringManager::new(KEYRING_SERVICE),
        }
    }

    pub fn load(&self) -> Result<AppConfig> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                warn!(error = %err, "Failed to read .env file");
            }
        }

        let path = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
        let mut config: AppConfig = AppConfig::figment(path).extract()?;
        self.fill_api_key(&mut config.llm);

        Ok(config)
    }

    /// Falls back to the OS keyring when no key came from the environment.
    fn fill_api_key(&self, llm: &mut LLMConfig) {
        if llm.api_key.as_deref().is_some_and(|key| !key.is_empty()) {
            return;
        }

        let provider = llm.provider.key_name();
        match self.keyring.get_secret(provider) {
            Ok(secret) => {
                debug!(provider, "Using API key from keyring");
                llm.api_key = Some(secret);
            }
            Err(err) => {
                debug!(provider, error = %err, "No API key configured");
                llm.api_key = None;
            }
        }
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
