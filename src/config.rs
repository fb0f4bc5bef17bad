//! Connection settings resolution
//!
//! Settings are built once from command line overrides, the environment
//! and an optional TOML file, in that order of precedence. The
//! environment is passed in as a lookup function so resolution never
//! reads process state itself.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::client::VaultClientConfig;
use crate::error::VizError;
use crate::tree::DEFAULT_BASE_PATH;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = ".vaultviz.toml";
pub const DEFAULT_PORT: u16 = 8200;
pub const DEFAULT_TIMEOUT: &str = "30s";

pub const ENV_TOKEN: &str = "VAULT_TOKEN";
pub const ENV_SKIP_VERIFY: &str = "VAULT_SKIP_VERIFY";
pub const ENV_ADDR: &str = "VAULT_ADDR";

/// A boolean that may be written as `true` or as `"true"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BoolSetting {
    Bool(bool),
    Text(String),
}

/// Contents of the TOML config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub address: Option<String>,
    pub token: Option<String>,
    pub skip_verify: Option<BoolSetting>,
    pub tag: Option<String>,
    pub datacenter: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
    pub timeout: Option<String>,
}

impl FileConfig {
    /// Load `path`. A missing file is an error only when `required`.
    pub fn load(path: &Path, required: bool) -> Result<Self, VizError> {
        let err = |reason: String| VizError::ConfigFile {
            path: path.to_path_buf(),
            reason,
        };
        if !path.exists() {
            return if required {
                Err(err("file not found".to_string()))
            } else {
                Ok(Self::default())
            };
        }
        let content = std::fs::read_to_string(path).map_err(|e| err(e.to_string()))?;
        Self::parse(&content).map_err(|e| err(e.to_string()))
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub address: Option<String>,
    pub token: Option<String>,
    pub skip_verify: bool,
    pub tag: Option<String>,
    pub datacenter: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
    pub timeout: Option<String>,
}

/// Fully resolved connection settings.
#[derive(Clone)]
pub struct Settings {
    /// `None` when neither an address nor tag/datacenter were configured
    pub address: Option<Url>,
    pub token: Option<String>,
    pub skip_verify: bool,
    pub tag: Option<String>,
    pub datacenter: Option<String>,
    pub port: u16,
    pub base_path: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("address", &self.address.as_ref().map(Url::as_str))
            .field("token", &self.token_state())
            .field("skip_verify", &self.skip_verify)
            .field("tag", &self.tag)
            .field("datacenter", &self.datacenter)
            .field("port", &self.port)
            .field("base_path", &self.base_path)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Settings {
    pub fn resolve<E>(overrides: &Overrides, file: &FileConfig, env: E) -> Result<Self, VizError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let token = non_empty(overrides.token.clone())
            .or_else(|| env(ENV_TOKEN))
            .or_else(|| non_empty(file.token.clone()));

        let skip_verify = if overrides.skip_verify {
            true
        } else if let Some(raw) = env(ENV_SKIP_VERIFY) {
            parse_bool(&raw).ok_or_else(|| {
                VizError::Config(format!("{} is not a boolean: '{}'", ENV_SKIP_VERIFY, raw))
            })?
        } else {
            match &file.skip_verify {
                Some(BoolSetting::Bool(b)) => *b,
                Some(BoolSetting::Text(raw)) => parse_bool(raw).ok_or_else(|| {
                    VizError::Config(format!("skip_verify is not a boolean: '{}'", raw))
                })?,
                None => false,
            }
        };

        let tag = non_empty(overrides.tag.clone()).or_else(|| non_empty(file.tag.clone()));
        let datacenter =
            non_empty(overrides.datacenter.clone()).or_else(|| non_empty(file.datacenter.clone()));
        let port = overrides.port.or(file.port).unwrap_or(DEFAULT_PORT);

        let explicit = non_empty(overrides.address.clone())
            .or_else(|| env(ENV_ADDR))
            .or_else(|| non_empty(file.address.clone()));
        let address = match (explicit, &tag, &datacenter) {
            (Some(addr), _, _) => Some(parse_address(&addr)?),
            (None, Some(tag), Some(dc)) => Some(parse_address(&consul_address(tag, dc, port))?),
            _ => None,
        };

        let base_path = non_empty(overrides.path.clone())
            .or_else(|| non_empty(file.path.clone()))
            .unwrap_or_else(|| DEFAULT_BASE_PATH.to_string())
            .trim_matches('/')
            .to_string();
        if base_path.is_empty() {
            return Err(VizError::Config("base path is empty".to_string()));
        }

        let raw_timeout = overrides
            .timeout
            .clone()
            .or_else(|| file.timeout.clone())
            .unwrap_or_else(|| DEFAULT_TIMEOUT.to_string());
        let timeout = humantime::parse_duration(raw_timeout.trim()).map_err(|e| {
            VizError::Config(format!("invalid timeout '{}': {}", raw_timeout, e))
        })?;

        Ok(Self {
            address,
            token,
            skip_verify,
            tag,
            datacenter,
            port,
            base_path,
            timeout,
        })
    }

    /// Client settings. Fails when no server address could be determined.
    pub fn client_config(&self) -> Result<VaultClientConfig, VizError> {
        let address = self.address.clone().ok_or_else(|| {
            VizError::Config(
                "missing config variable: set --address, or --tag and --datacenter".to_string(),
            )
        })?;
        Ok(VaultClientConfig {
            address,
            token: self.token.clone(),
            skip_verify: self.skip_verify,
            timeout: self.timeout,
        })
    }

    /// Whether a token was resolved, without revealing it.
    pub fn token_state(&self) -> &'static str {
        if self.token.is_some() { "<set>" } else { "<unset>" }
    }
}

/// Server address published through consul service discovery.
pub fn consul_address(tag: &str, datacenter: &str, port: u16) -> String {
    format!("https://{}.vault.service.{}.consul:{}", tag, datacenter, port)
}

/// Parse the boolean spellings accepted for `skip_verify`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn parse_address(raw: &str) -> Result<Url, VizError> {
    Url::parse(raw.trim()).map_err(|e| VizError::Config(format!("invalid address '{}': {}", raw, e)))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn file_with_token() -> FileConfig {
        FileConfig {
            token: Some("4321".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_token_flag_wins() {
        let overrides = Overrides {
            token: Some("138".to_string()),
            ..Default::default()
        };
        let settings =
            Settings::resolve(&overrides, &file_with_token(), env_of(&[(ENV_TOKEN, "1234")]))
                .unwrap();
        assert_eq!(settings.token.as_deref(), Some("138"));
    }

    #[test]
    fn test_token_env_beats_file() {
        let settings = Settings::resolve(
            &Overrides::default(),
            &file_with_token(),
            env_of(&[(ENV_TOKEN, "1234")]),
        )
        .unwrap();
        assert_eq!(settings.token.as_deref(), Some("1234"));
    }

    #[test]
    fn test_token_falls_back_to_file() {
        let settings = Settings::resolve(
            &Overrides::default(),
            &file_with_token(),
            env_of(&[(ENV_TOKEN, "")]),
        )
        .unwrap();
        assert_eq!(settings.token.as_deref(), Some("4321"));
    }

    #[test]
    fn test_skip_verify_defaults_to_false() {
        let settings =
            Settings::resolve(&Overrides::default(), &FileConfig::default(), env_of(&[])).unwrap();
        assert!(!settings.skip_verify);
    }

    #[test]
    fn test_skip_verify_flag_and_env() {
        let overrides = Overrides {
            skip_verify: true,
            ..Default::default()
        };
        let from_flag =
            Settings::resolve(&overrides, &FileConfig::default(), env_of(&[])).unwrap();
        assert!(from_flag.skip_verify);

        let from_env = Settings::resolve(
            &Overrides::default(),
            &FileConfig::default(),
            env_of(&[(ENV_SKIP_VERIFY, "true")]),
        )
        .unwrap();
        assert!(from_env.skip_verify);
    }

    #[test]
    fn test_skip_verify_garbage_is_config_error() {
        let result = Settings::resolve(
            &Overrides::default(),
            &FileConfig::default(),
            env_of(&[(ENV_SKIP_VERIFY, "maybe")]),
        );
        assert!(matches!(result, Err(VizError::Config(_))));
    }

    #[test]
    fn test_consul_address_from_tag_datacenter_port() {
        let overrides = Overrides {
            tag: Some("foo".to_string()),
            datacenter: Some("bar".to_string()),
            port: Some(42),
            ..Default::default()
        };
        let settings =
            Settings::resolve(&overrides, &FileConfig::default(), env_of(&[])).unwrap();
        assert_eq!(
            settings.address.unwrap().as_str(),
            "https://foo.vault.service.bar.consul:42/"
        );
    }

    #[test]
    fn test_explicit_address_beats_consul_naming() {
        let overrides = Overrides {
            tag: Some("foo".to_string()),
            datacenter: Some("bar".to_string()),
            ..Default::default()
        };
        let settings = Settings::resolve(
            &overrides,
            &FileConfig::default(),
            env_of(&[(ENV_ADDR, "http://127.0.0.1:8200")]),
        )
        .unwrap();
        assert_eq!(settings.address.unwrap().as_str(), "http://127.0.0.1:8200/");
    }

    #[test]
    fn test_missing_address_fails_only_when_connecting() {
        let overrides = Overrides {
            tag: Some("foo".to_string()),
            ..Default::default()
        };
        let settings =
            Settings::resolve(&overrides, &FileConfig::default(), env_of(&[])).unwrap();
        assert!(settings.address.is_none());
        assert!(matches!(settings.client_config(), Err(VizError::Config(_))));
    }

    #[test]
    fn test_timeout_and_path_defaults() {
        let settings =
            Settings::resolve(&Overrides::default(), &FileConfig::default(), env_of(&[])).unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.base_path, "secret");
        assert_eq!(settings.port, DEFAULT_PORT);
    }

    #[test]
    fn test_invalid_timeout() {
        let overrides = Overrides {
            timeout: Some("soon".to_string()),
            ..Default::default()
        };
        let result = Settings::resolve(&overrides, &FileConfig::default(), env_of(&[]));
        assert!(matches!(result, Err(VizError::Config(_))));
    }

    #[test]
    fn test_debug_output_redacts_token() {
        let settings = Settings::resolve(
            &Overrides::default(),
            &file_with_token(),
            env_of(&[]),
        )
        .unwrap();
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("4321"));
        assert!(debug.contains("<set>"));
    }

    #[test]
    fn test_file_config_parsing() {
        let file = FileConfig::parse(
            r#"
            token = "abc"
            skip_verify = "true"
            tag = "prod"
            datacenter = "us-east"
            port = 8201
            path = "kv"
            "#,
        )
        .unwrap();
        assert_eq!(file.skip_verify, Some(BoolSetting::Text("true".to_string())));
        assert_eq!(file.port, Some(8201));

        let settings = Settings::resolve(&Overrides::default(), &file, env_of(&[])).unwrap();
        assert!(settings.skip_verify);
        assert_eq!(settings.base_path, "kv");
        assert_eq!(
            settings.address.unwrap().as_str(),
            "https://prod.vault.service.us-east.consul:8201/"
        );
    }

    #[test]
    fn test_file_config_rejects_unknown_keys() {
        assert!(FileConfig::parse("colour = \"red\"").is_err());
    }

    #[test]
    fn test_missing_default_file_is_empty_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        assert_eq!(FileConfig::load(&path, false).unwrap(), FileConfig::default());
        assert!(FileConfig::load(&path, true).is_err());
    }
}
