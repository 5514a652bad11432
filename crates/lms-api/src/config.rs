use anyhow::{Context, bail};
use serde::Deserialize;

/// Minimum length of `JWT_SECRET`, in bytes
pub const MIN_JWT_SECRET_LEN: usize = 32;
/// Minimum length of `COOKIE_SECRET`, in bytes (required by the cookie key derivation)
pub const MIN_COOKIE_SECRET_LEN: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!(
                "invalid ENV '{other}', expected 'development' or 'production'"
            )),
        }
    }
}

/// Process configuration, read from environment variables.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub cookie_secret: String,
    #[serde(default)]
    pub env: Environment,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Comma separated in the environment
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_rate_limit_per_second")]
    pub rate_limit_per_second: u64,
    #[serde(default = "default_rate_limit_burst")]
    pub rate_limit_burst: u32,
    #[serde(default = "default_leaderboard_max_limit")]
    pub leaderboard_max_limit: i64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:8080".to_string()]
}

const fn default_db_max_connections() -> u32 {
    10
}

const fn default_rate_limit_per_second() -> u64 {
    10
}

const fn default_rate_limit_burst() -> u32 {
    20
}

const fn default_leaderboard_max_limit() -> i64 {
    100
}

impl ApiConfig {
    /// Load from the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> anyhow::Result<Self> {
        let config: Self =
            envy::from_env().context("failed to read configuration from environment")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit list of `(NAME, value)` pairs.
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::from_iter(vars).context("failed to read configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            bail!("JWT_SECRET must be at least {MIN_JWT_SECRET_LEN} bytes long");
        }
        if self.cookie_secret.len() < MIN_COOKIE_SECRET_LEN {
            bail!("COOKIE_SECRET must be at least {MIN_COOKIE_SECRET_LEN} bytes long");
        }
        if self.db_max_connections == 0 {
            bail!("DB_MAX_CONNECTIONS must be positive");
        }
        if self.rate_limit_per_second == 0 || self.rate_limit_burst == 0 {
            bail!("RATE_LIMIT_PER_SECOND and RATE_LIMIT_BURST must be positive");
        }
        if self.leaderboard_max_limit < 1 {
            bail!("LEADERBOARD_MAX_LIMIT must be at least 1");
        }
        Ok(())
    }

    /// Allowed CORS origins with surrounding whitespace and empty entries removed.
    pub fn parsed_allowed_origins(&self) -> Vec<String> {
        self.allowed_origins
            .iter()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
