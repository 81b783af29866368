use std::time::Duration;

use anyhow::Context;
/// Signing key used when no `JWT_SECRET` is configured outside production.
pub const DEV_FALLBACK_SECRET: &str = "tasktracker_development_secret_key";

const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub cors_origins: Vec<String>,
    pub bootstrap_admin_email: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let env = match var("APP_ENV").as_deref() {
            None | Some("development") | Some("dev") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            Some(other) => anyhow::bail!("unknown APP_ENV `{other}`"),
        };

        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let secret = match (var("JWT_SECRET"), env) {
            (Some(s), Environment::Production) if s == DEV_FALLBACK_SECRET => {
                anyhow::bail!("JWT_SECRET must not be the development fallback key in production")
            }
            (Some(s), _) => s,
            (None, Environment::Production) => {
                anyhow::bail!("JWT_SECRET must be set when APP_ENV=production")
            }
            (None, Environment::Development) => {
                tracing::warn!("JWT_SECRET not set; using the development fallback key");
                DEV_FALLBACK_SECRET.to_string()
            }
        };

        let ttl = match var("JWT_EXPIRES_IN") {
            Some(raw) => parse_ttl(&raw).with_context(|| format!("invalid JWT_EXPIRES_IN `{raw}`"))?,
            None => DEFAULT_TOKEN_TTL,
        };

        let jwt = JwtConfig {
            secret,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "tasktracker".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "tasktracker-users".into()),
            ttl,
        };

        let db_max_connections = var("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let port = match var("APP_PORT") {
            Some(p) => p.parse::<u16>().with_context(|| format!("invalid APP_PORT `{p}`"))?,
            None => 5001,
        };

        let cors_origins = var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            env,
            database_url,
            db_max_connections,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            jwt,
            cors_origins,
            bootstrap_admin_email: var("BOOTSTRAP_ADMIN_EMAIL").map(|e| e.to_lowercase()),
        })
    }
}

/// Parses `7d`, `12h`, `30m`, `45s` or a bare number of seconds.
pub fn parse_ttl(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&raw[..idx], c),
        Some(_) => (raw, 's'),
        None => anyhow::bail!("empty duration"),
    };
    let n: u64 = digits.parse().context("duration must start with a number")?;
    let unit_secs: u64 = match unit {
        'd' => 24 * 60 * 60,
        'h' => 60 * 60,
        'm' => 60,
        's' => 1,
        other => anyhow::bail!("unknown duration unit `{other}`"),
    };
    let secs = n.checked_mul(unit_secs).context("duration too large")?;
    anyhow::ensure!(secs > 0, "duration must be positive");
    Ok(Duration::from_secs(secs))
}
