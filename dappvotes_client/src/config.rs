//! Client configuration from the environment or a YAML file

use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

pub const ENV_PINATA_API_KEY: &str = "NEXT_PUBLIC_PINATA_API_KEY";
pub const ENV_PINATA_SECRET_API_KEY: &str = "NEXT_PUBLIC_PINATA_SECRET_API_KEY";
pub const ENV_PINATA_GATEWAY_URL: &str = "NEXT_PUBLIC_PINATA_GATEWAY_URL";
pub const ENV_PINATA_API_URL: &str = "PINATA_API_URL";
pub const ENV_RPC_URL: &str = "DAPPVOTES_RPC_URL";
pub const ENV_CONTRACT_ADDRESS: &str = "DAPPVOTES_CONTRACT_ADDRESS";
pub const ENV_PRIVATE_KEY: &str = "DAPPVOTES_PRIVATE_KEY";
pub const ENV_CONFIRMATIONS: &str = "DAPPVOTES_CONFIRMATIONS";

/// Public Pinata API
pub const DEFAULT_PINATA_API_URL: &str = "https://api.pinata.cloud";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),

    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Pinata credentials and endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PinataConfig {
    pub api_key: String,
    pub secret_api_key: String,
    /// Gateway base, e.g. `https://example.mypinata.cloud`
    pub gateway_url: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    DEFAULT_PINATA_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl PinataConfig {
    pub fn new(api_key: String, secret_api_key: String, gateway_url: String) -> Self {
        Self {
            api_key,
            secret_api_key,
            gateway_url,
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Read `NEXT_PUBLIC_PINATA_*` variables, `PINATA_API_URL` optional
    pub fn from_env() -> Result<Self> {
        Self::from_vars(&env_var)
    }

    pub fn from_vars(vars: &VarLookup<'_>) -> Result<Self> {
        let mut config = Self::new(
            require_var(vars, ENV_PINATA_API_KEY)?,
            require_var(vars, ENV_PINATA_SECRET_API_KEY)?,
            require_var(vars, ENV_PINATA_GATEWAY_URL)?,
        );
        if let Some(api_url) = optional_var(vars, ENV_PINATA_API_URL) {
            config.api_url = api_url;
        }
        config.validated()
    }

    /// Check URLs and strip trailing slashes
    pub fn validated(mut self) -> Result<Self> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_PINATA_API_KEY));
        }
        if self.secret_api_key.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_PINATA_SECRET_API_KEY));
        }
        self.gateway_url = normalize_url("gateway_url", &self.gateway_url)?;
        self.api_url = normalize_url("api_url", &self.api_url)?;
        Ok(self)
    }
}

/// DappVotes contract connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub contract_address: String,
    /// Hex private key; without it the client is read-only
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default = "default_confirmations")]
    pub confirmations: usize,
}

fn default_confirmations() -> usize {
    1
}

impl ChainConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(&env_var)
    }

    /// Required variables are checked before optional ones are parsed
    pub fn from_vars(vars: &VarLookup<'_>) -> Result<Self> {
        let rpc_url = require_var(vars, ENV_RPC_URL)?;
        let contract_address = require_var(vars, ENV_CONTRACT_ADDRESS)?;
        let confirmations = match optional_var(vars, ENV_CONFIRMATIONS) {
            Some(raw) => raw.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                field: ENV_CONFIRMATIONS,
                value: raw,
            })?,
            None => default_confirmations(),
        };

        Self {
            rpc_url,
            contract_address,
            private_key: optional_var(vars, ENV_PRIVATE_KEY),
            confirmations,
        }
        .validated()
    }

    pub fn validated(mut self) -> Result<Self> {
        self.rpc_url = normalize_url("rpc_url", &self.rpc_url)?;
        if self.contract_address.trim().is_empty() {
            return Err(ConfigError::Missing(ENV_CONTRACT_ADDRESS));
        }
        self.contract_address = self.contract_address.trim().to_string();
        Ok(self)
    }
}

/// Everything the CLI may need; either half can be absent
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    #[serde(default)]
    pub pinata: Option<PinataConfig>,
    #[serde(default)]
    pub chain: Option<ChainConfig>,
}

impl ClientConfig {
    /// Each section is picked up when its required variables are set
    pub fn from_env() -> Result<Self> {
        Self::from_vars(&env_var)
    }

    pub fn from_vars(vars: &VarLookup<'_>) -> Result<Self> {
        let pinata = match PinataConfig::from_vars(vars) {
            Ok(config) => Some(config),
            Err(ConfigError::Missing(name)) => {
                log::debug!("Pinata not configured: {} unset", name);
                None
            }
            Err(e) => return Err(e),
        };
        let chain = match ChainConfig::from_vars(vars) {
            Ok(config) => Some(config),
            Err(ConfigError::Missing(name)) => {
                log::debug!("Chain not configured: {} unset", name);
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Self { pinata, chain })
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let config: ClientConfig = serde_yaml::from_str(contents)?;
        Ok(Self {
            pinata: config.pinata.map(PinataConfig::validated).transpose()?,
            chain: config.chain.map(ChainConfig::validated).transpose()?,
        })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// YAML file when given, environment otherwise
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_yaml_file(path),
            None => Self::from_env(),
        }
    }

    pub fn require_pinata(&self) -> Result<&PinataConfig> {
        self.pinata
            .as_ref()
            .ok_or(ConfigError::Missing(ENV_PINATA_API_KEY))
    }

    pub fn require_chain(&self) -> Result<&ChainConfig> {
        self.chain.as_ref().ok_or(ConfigError::Missing(ENV_RPC_URL))
    }
}

/// Source of configuration variables, the process environment outside tests
pub type VarLookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn require_var(vars: &VarLookup<'_>, name: &'static str) -> Result<String> {
    optional_var(vars, name).ok_or(ConfigError::Missing(name))
}

fn optional_var(vars: &VarLookup<'_>, name: &str) -> Option<String> {
    vars(name).filter(|v| !v.trim().is_empty())
}

fn normalize_url(field: &'static str, raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidUrl {
            field,
            reason: "empty".to_string(),
        });
    }
    let parsed = Url::parse(trimmed).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            field,
            reason: format!("unsupported scheme {}", parsed.scheme()),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_config_with_defaults() {
        let config = ClientConfig::from_yaml_str(
            r#"
pinata:
  api_key: key
  secret_api_key: secret
  gateway_url: https://gw.example/
chain:
  rpc_url: http://127.0.0.1:8545
  contract_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3"
"#,
        )
        .unwrap();

        let pinata = config.require_pinata().unwrap();
        assert_eq!(pinata.gateway_url, "https://gw.example");
        assert_eq!(pinata.api_url, DEFAULT_PINATA_API_URL);
        assert_eq!(pinata.timeout_secs, 30);

        let chain = config.require_chain().unwrap();
        assert_eq!(chain.confirmations, 1);
        assert!(chain.private_key.is_none());
    }

    #[test]
    fn test_missing_sections_are_reported() {
        let config = ClientConfig::from_yaml_str("{}").unwrap();
        assert!(matches!(
            config.require_pinata(),
            Err(ConfigError::Missing(ENV_PINATA_API_KEY))
        ));
        assert!(config.require_chain().is_err());
    }

    #[test]
    fn test_invalid_gateway_is_rejected() {
        let config = PinataConfig::new(
            "key".to_string(),
            "secret".to_string(),
            "ftp://gw.example".to_string(),
        );
        assert!(matches!(
            config.validated(),
            Err(ConfigError::InvalidUrl { field: "gateway_url", .. })
        ));
    }

    #[test]
    fn test_blank_credentials_are_missing() {
        let config = PinataConfig::new(
            " ".to_string(),
            "secret".to_string(),
            "https://gw.example".to_string(),
        );
        assert!(matches!(config.validated(), Err(ConfigError::Missing(_))));
    }

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_bad_confirmations_without_chain_vars_leaves_chain_unset() {
        let vars = lookup(&[(ENV_CONFIRMATIONS, "many")]);

        let config = ClientConfig::from_vars(&vars).unwrap();
        assert!(config.chain.is_none());
        assert!(config.pinata.is_none());
    }

    #[test]
    fn test_bad_confirmations_with_chain_vars_is_rejected() {
        let vars = lookup(&[
            (ENV_RPC_URL, "http://127.0.0.1:8545"),
            (ENV_CONTRACT_ADDRESS, "0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            (ENV_CONFIRMATIONS, "many"),
        ]);

        assert_eq!(
            ClientConfig::from_vars(&vars).unwrap_err().to_string(),
            ConfigError::InvalidValue {
                field: ENV_CONFIRMATIONS,
                value: "many".to_string(),
            }
            .to_string()
        );
    }

    #[test]
    fn test_chain_from_vars() {
        let vars = lookup(&[
            (ENV_RPC_URL, "http://127.0.0.1:8545/"),
            (ENV_CONTRACT_ADDRESS, "0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            (ENV_CONFIRMATIONS, "3"),
            (ENV_PRIVATE_KEY, " "),
        ]);

        let chain = ChainConfig::from_vars(&vars).unwrap();
        assert_eq!(chain.confirmations, 3);
        assert!(chain.private_key.is_none());
    }
}
