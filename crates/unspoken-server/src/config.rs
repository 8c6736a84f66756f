use anyhow::{Context, Result, bail};

use unspoken_api::{ProviderKind, SessionSettings};

pub const PLACEHOLDER_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub seed: bool,
    pub sessions: SessionSettings,
    pub echo: EchoConfig,
}

#[derive(Clone)]
pub struct EchoConfig {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl std::fmt::Debug for EchoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EchoConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .finish()
    }
}

fn truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("UNSPOKEN_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("UNSPOKEN_PORT is not a valid port: {}", raw))?,
            None => 3000,
        };

        let ttl_days: i64 = match var("UNSPOKEN_SESSION_DAYS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("UNSPOKEN_SESSION_DAYS is not a number: {}", raw))?,
            None => 30,
        };
        if !(1..=SessionSettings::MAX_TTL_DAYS).contains(&ttl_days) {
            bail!(
                "UNSPOKEN_SESSION_DAYS must be between 1 and {}, got {}",
                SessionSettings::MAX_TTL_DAYS,
                ttl_days
            );
        }

        let provider: ProviderKind = var("ECHO_PROVIDER")
            .unwrap_or_else(|| "gemini".into())
            .parse()?;
        let api_key = match provider {
            ProviderKind::Gemini => var("GEMINI_API_KEY"),
            ProviderKind::Anthropic => var("ANTHROPIC_API_KEY"),
        };

        Ok(Self {
            host: var("UNSPOKEN_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: var("UNSPOKEN_DB_PATH").unwrap_or_else(|| "unspoken.db".into()),
            seed: var("UNSPOKEN_SEED").is_some_and(|v| truthy(&v)),
            sessions: SessionSettings {
                jwt_secret: var("UNSPOKEN_JWT_SECRET").unwrap_or_else(|| PLACEHOLDER_SECRET.into()),
                ttl_days,
                require_session: var("UNSPOKEN_REQUIRE_SESSION").is_some_and(|v| truthy(&v)),
            },
            echo: EchoConfig {
                provider,
                api_key,
                model: var("ECHO_MODEL"),
            },
        })
    }

    pub fn uses_placeholder_secret(&self) -> bool {
        self.sessions.jwt_secret == PLACEHOLDER_SECRET
    }
}
