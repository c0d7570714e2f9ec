//! Configuration management for the Nexus push CLI
//!
//! Handles loading, validating, and persisting CLI configuration including
//! target environments, product profile maps, and lifecycle tuning knobs.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub mod defaults;

use defaults::*;

/// Environment variable that overrides any configured password
pub const PASSWORD_ENV_VAR: &str = "NEXUS_PUSH_PASSWORD";

/// GA vs Early-Access quality level, each mapped to distinct staging and
/// promotion profile ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityLevel {
    /// General Availability
    Ga,
    /// Early Access
    Ea,
}

impl QualityLevel {
    /// Map the CLI `--ga` flag to a quality level
    pub fn from_ga_flag(ga: bool) -> Self {
        if ga {
            Self::Ga
        } else {
            Self::Ea
        }
    }

    /// Human-readable destination label used in staging descriptions
    pub fn group_label(self) -> &'static str {
        match self {
            Self::Ga => "GA",
            Self::Ea => "Early-Access",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ga => "GA",
            Self::Ea => "EA",
        })
    }
}

/// Main CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Target Nexus environments, keyed by name
    #[serde(default)]
    pub environments: BTreeMap<String, Environment>,

    /// Product profile maps, keyed by product key
    #[serde(default)]
    pub products: BTreeMap<String, Product>,

    /// Zip partitioning bounds
    #[serde(default)]
    pub partition: PartitionSettings,

    /// Activity polling behavior
    #[serde(default)]
    pub polling: PollingSettings,
}

/// One target Nexus server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Environment {
    /// Base URL of the Nexus server, e.g. `https://repository.example.com`
    pub url: String,

    /// Username for basic auth; anonymous access when absent
    pub username: Option<String>,

    /// Password, either a literal or `env:<VAR>` to read an environment variable
    pub password: Option<String>,

    /// Verify TLS certificates
    #[serde(default = "default_ssl_verify")]
    pub ssl_verify: bool,
}

/// Staging and promotion profile ids for one product
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct Product {
    /// GA staging profile id
    pub ga: Option<String>,

    /// Early-Access staging profile id
    pub ea: Option<String>,

    /// Promotion profile chain applied after a GA close
    #[serde(default)]
    pub ga_promote_profiles: Vec<String>,

    /// Promotion profile chain applied after an Early-Access close
    #[serde(default)]
    pub ea_promote_profiles: Vec<String>,
}

/// Zip partitioning bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PartitionSettings {
    /// Maximum entries per zip part
    #[serde(default = "default_max_count")]
    pub max_count: usize,

    /// Maximum cumulative uncompressed bytes per zip part
    #[serde(default = "default_max_size")]
    pub max_size: u64,
}

impl Default for PartitionSettings {
    fn default() -> Self {
        Self {
            max_count: default_max_count(),
            max_size: default_max_size(),
        }
    }
}

/// Activity polling behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PollingSettings {
    /// Seconds between poll attempts
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,

    /// Give up after this many attempts; unbounded when absent
    pub max_attempts: Option<u32>,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
            max_attempts: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Err(CliError::NoConfig);
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| CliError::ConfigRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| CliError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Get the path to the config file
    ///
    /// `$XDG_CONFIG_HOME/nexus-push/config.toml`, falling back to
    /// `~/.config/nexus-push/config.toml`.
    pub fn config_path() -> Result<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .ok()
            .and_then(|path| if path.is_empty() { None } else { Some(path) })
            .or_else(|| {
                dirs::home_dir().map(|home| home.join(".config").to_string_lossy().to_string())
            });

        config_home
            .ok_or_else(|| {
                CliError::Internal(
                    "Could not determine config directory: XDG_CONFIG_HOME not set \
                     and no home directory found"
                        .to_string(),
                )
            })
            .map(|path| PathBuf::from(path).join("nexus-push").join("config.toml"))
    }

    /// Look up an environment by name
    pub fn environment(&self, name: &str) -> Result<&Environment> {
        self.environments.get(name).ok_or_else(|| {
            CliError::InvalidConfig(format!("no environment named '{name}' in config"))
        })
    }

    fn product(&self, key: &str) -> Option<&Product> {
        // Product keys are conventionally upper-case in the config but the
        // CLI accepts any casing.
        self.products
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Resolve the staging profile id for a product at a quality level
    pub fn profile_id(&self, product: &str, quality: QualityLevel) -> Result<&str> {
        let missing = || CliError::MissingProfile {
            product: product.to_string(),
            quality: quality.to_string(),
        };

        let entry = self.product(product).ok_or_else(missing)?;
        let id = match quality {
            QualityLevel::Ga => entry.ga.as_deref(),
            QualityLevel::Ea => entry.ea.as_deref(),
        };
        id.filter(|id| !id.is_empty()).ok_or_else(missing)
    }

    /// Resolve the ordered promotion profile chain for a product at a quality level
    pub fn promote_profile_ids(&self, product: &str, quality: QualityLevel) -> Result<&[String]> {
        let entry = self.product(product).ok_or_else(|| CliError::MissingProfile {
            product: product.to_string(),
            quality: quality.to_string(),
        })?;
        Ok(match quality {
            QualityLevel::Ga => &entry.ga_promote_profiles,
            QualityLevel::Ea => &entry.ea_promote_profiles,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, env) in &self.environments {
            if env.url.is_empty() {
                return Err(CliError::InvalidConfig(format!(
                    "environment '{name}': url cannot be empty"
                )));
            }
        }

        if self.polling.interval_secs == 0 {
            return Err(CliError::InvalidConfig(
                "polling.interval-secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Environment {
    /// Resolve basic-auth credentials for this environment.
    ///
    /// Returns `None` for anonymous access (no username configured). The
    /// password is taken from `NEXUS_PUSH_PASSWORD` when set, otherwise from
    /// the config value, where `env:<VAR>` reads another environment variable.
    pub fn credentials(&self, environment: &str) -> Result<Option<(String, String)>> {
        let Some(username) = &self.username else {
            return Ok(None);
        };

        if let Ok(password) = std::env::var(PASSWORD_ENV_VAR) {
            if !password.is_empty() {
                return Ok(Some((username.clone(), password)));
            }
        }

        let missing = || CliError::MissingPassword {
            environment: environment.to_string(),
        };

        match self.password.as_deref() {
            Some(value) => {
                if let Some(var) = value.strip_prefix("env:") {
                    let password = std::env::var(var).map_err(|_| missing())?;
                    Ok(Some((username.clone(), password)))
                } else {
                    Ok(Some((username.clone(), value.to_string())))
                }
            }
            None => Err(missing()),
        }
    }
}

/// Starter configuration written by `nexus-push init`
pub const STARTER_CONFIG: &str = r#"# nexus-push configuration
#
# Each environment names a Nexus server; each product maps a product key to
# its staging and promotion profile ids.

[environments.prod]
url = "https://repository.example.com"
# username = "jdoe"
# password = "env:NEXUS_PASSWORD"
# ssl-verify = true

# [products.EAP]
# ga = "0123456789"
# ea = "9876543210"
# ga-promote-profiles = ["1111111111", "2222222222"]
# ea-promote-profiles = ["3333333333"]

# [partition]
# max-count = 1000
# max-size = 1000000000

# [polling]
# interval-secs = 3
# max-attempts = 100    # omit for unbounded polling
"#;

/// Write the starter configuration to the default location.
///
/// Refuses to overwrite an existing file.
pub fn init_config() -> Result<PathBuf> {
    let path = Config::config_path()?;
    if path.exists() {
        return Err(CliError::InvalidConfig(format!(
            "{} already exists",
            path.display()
        )));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CliError::Dir {
            path: parent.to_path_buf(),
            reason: e.to_string(),
        })?;
    }

    fs::write(&path, STARTER_CONFIG).map_err(|e| CliError::ConfigWrite {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    // Config may hold credentials; keep it private
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, Permissions::from_mode(0o600)).map_err(|e| {
            CliError::ConfigWrite {
                path: path.clone(),
                reason: format!("Failed to set permissions: {e}"),
            }
        })?;
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [environments.prod]
        url = "https://repository.example.com"
        username = "jdoe"
        password = "hunter2"

        [products.EAP]
        ga = "0123456789"
        ea = "9876543210"
        ga-promote-profiles = ["aaa", "bbb"]
        ea-promote-profiles = ["ccc"]
    "#;

    fn sample() -> Config {
        toml::from_str(SAMPLE).expect("sample config should parse")
    }

    #[test]
    fn parses_sample_config() {
        let config = sample();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.environment("prod").expect("prod exists").url,
            "https://repository.example.com"
        );
        assert_eq!(config.partition.max_count, 1000);
        assert_eq!(config.partition.max_size, 1_000_000_000);
        assert_eq!(config.polling.interval_secs, 3);
        assert_eq!(config.polling.max_attempts, None);
    }

    #[test]
    fn profile_lookup_is_case_insensitive() {
        let config = sample();
        assert_eq!(
            config
                .profile_id("eap", QualityLevel::Ga)
                .expect("ga profile"),
            "0123456789"
        );
        assert_eq!(
            config
                .profile_id("EAP", QualityLevel::Ea)
                .expect("ea profile"),
            "9876543210"
        );
    }

    #[test]
    fn missing_profile_is_a_configuration_error() {
        let config = sample();
        let err = config
            .profile_id("unknown", QualityLevel::Ga)
            .expect_err("unknown product");
        assert!(matches!(err, CliError::MissingProfile { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn promotion_chain_preserves_order() {
        let config = sample();
        let chain = config
            .promote_profile_ids("eap", QualityLevel::Ga)
            .expect("chain");
        assert_eq!(chain, ["aaa".to_string(), "bbb".to_string()]);
    }

    #[test]
    fn literal_password_resolves() {
        let config = sample();
        let env = config.environment("prod").expect("prod exists");
        let (user, password) = env
            .credentials("prod")
            .expect("credentials resolve")
            .expect("credentials present");
        assert_eq!(user, "jdoe");
        assert_eq!(password, "hunter2");
    }

    #[test]
    fn anonymous_environment_has_no_credentials() {
        let env = Environment {
            url: "https://repository.example.com".to_string(),
            username: None,
            password: None,
            ssl_verify: true,
        };
        assert!(env.credentials("prod").expect("resolves").is_none());
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let config = sample();
        assert!(matches!(
            config.environment("staging"),
            Err(CliError::InvalidConfig(_))
        ));
    }

    #[test]
    fn starter_config_parses() {
        let config: Config = toml::from_str(STARTER_CONFIG).expect("starter config is valid TOML");
        assert!(config.environments.contains_key("prod"));
    }
}
