use std::{env, fmt, net::SocketAddr};

use super::{database_url, server_bind_address};

/// Application runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }

    /// Returns `true` when the current environment should behave as development.
    pub fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    /// Returns the canonical name used for logging/metrics labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// How dividend listings report an empty result.
///
/// `Compat` answers an empty dividend listing with 404, matching the
/// behaviour existing dashboards depend on. `Uniform` answers 200 with an
/// empty list, the same way company listings always do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyListPolicy {
    #[default]
    Compat,
    Uniform,
}

impl EmptyListPolicy {
    fn from_str(value: &str) -> Result<Self, ConfigError> {
        match value {
            "compat" => Ok(Self::Compat),
            "uniform" => Ok(Self::Uniform),
            other => Err(ConfigError::InvalidEmptyListPolicy(other.to_string())),
        }
    }

    /// Returns `true` when an empty dividend listing should be reported as not found.
    pub fn empty_is_not_found(self) -> bool {
        matches!(self, Self::Compat)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compat => "compat",
            Self::Uniform => "uniform",
        }
    }
}

/// Runtime configuration resolved from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    pub database_url: String,
    pub empty_list_policy: EmptyListPolicy,
}

impl AppConfig {
    /// Constructs the configuration by reading and validating environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_value = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let environment = Environment::from_str(&env_value)?;
        let bind_addr = server_bind_address().map_err(ConfigError::BindAddress)?;
        let empty_list_policy = match env::var("APP_EMPTY_LIST_POLICY") {
            Ok(value) => EmptyListPolicy::from_str(value.trim())?,
            Err(_) => EmptyListPolicy::default(),
        };

        Ok(Self {
            bind_addr,
            environment,
            database_url: database_url(),
            empty_list_policy,
        })
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    InvalidEnvironment(String),
    BindAddress(std::net::AddrParseError),
    InvalidEmptyListPolicy(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEnvironment(value) => write!(
                f,
                "APP_ENV must be one of 'development', 'production', or 'test' (got {value})"
            ),
            Self::BindAddress(err) => write!(f, "invalid APP_BIND_ADDR value: {err}"),
            Self::InvalidEmptyListPolicy(value) => write!(
                f,
                "APP_EMPTY_LIST_POLICY must be 'compat' or 'uniform' (got {value})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
