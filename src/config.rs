use std::str::FromStr;

use crate::identity::MAX_TOKEN_CACHE_TTL;

/// Where applicant records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// In-process store; data is lost on restart. Local development only.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("STORAGE_BACKEND must be 'postgres' or 'memory', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub port: u16,
    pub storage_backend: StorageBackend,
    pub identity_api_key: String,
    pub identity_base_url: String,
    /// `["*"]` means any origin.
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub db_max_lifetime_secs: u64,
    pub db_health_check_interval_secs: u64,
    pub token_cache_ttl_secs: u64,
    pub run_migrations: bool,
    pub request_body_limit_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let storage_backend = std::env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse::<StorageBackend>()?;

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());
        if let Some(url) = &database_url {
            if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
            }
        }
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL environment variable required");
        }

        let config = Self {
            database_url,
            port: env_or("PORT", 5000)
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            storage_backend,
            identity_api_key: std::env::var("IDENTITY_API_KEY")
                .or_else(|_| std::env::var("FIREBASE_API_KEY"))
                .map_err(|_| {
                    anyhow::anyhow!("IDENTITY_API_KEY or FIREBASE_API_KEY environment variable required")
                })
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("IDENTITY_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            identity_base_url: validate_http_url(
                "IDENTITY_BASE_URL",
                &std::env::var("IDENTITY_BASE_URL")
                    .unwrap_or_else(|_| "https://identitytoolkit.googleapis.com".to_string()),
            )?,
            cors_origins: parse_cors_origins(
                &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()),
            ),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 20)?,
            db_min_connections: env_or("DB_MIN_CONNECTIONS", 2)?,
            db_acquire_timeout_secs: env_or("DB_ACQUIRE_TIMEOUT_SECS", 20)?,
            db_max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", 300)?,
            db_health_check_interval_secs: env_or("DB_HEALTH_CHECK_INTERVAL_SECS", 300)?,
            token_cache_ttl_secs: validate_token_cache_ttl(env_or("TOKEN_CACHE_TTL_SECS", 60)?)?,
            run_migrations: env_or("RUN_MIGRATIONS", true)?,
            request_body_limit_bytes: env_or("REQUEST_BODY_LIMIT_BYTES", 1024 * 1024)?,
        };

        if config.db_min_connections > config.db_max_connections {
            anyhow::bail!("DB_MIN_CONNECTIONS cannot exceed DB_MAX_CONNECTIONS");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        if let Some(url) = &config.database_url {
            tracing::debug!("Database URL: {}...", &url[..20.min(url.len())]);
        }
        tracing::debug!("Storage backend: {:?}", config.storage_backend);
        tracing::debug!("Identity Base URL: {}", config.identity_base_url);
        tracing::debug!("CORS origins: {:?}", config.cors_origins);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }
}

/// Reads `key`, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: '{}'", key, raw)),
        _ => Ok(default),
    }
}

/// Cached tokens outlive a revocation by up to this many seconds.
fn validate_token_cache_ttl(secs: u64) -> anyhow::Result<u64> {
    let max = MAX_TOKEN_CACHE_TTL.as_secs();
    if secs > max {
        anyhow::bail!("TOKEN_CACHE_TTL_SECS cannot exceed {}", max);
    }
    Ok(secs)
}

/// Checks that `value` is an http(s) URL and strips any trailing slash.
fn validate_http_url(key: &str, value: &str) -> anyhow::Result<String> {
    let parsed =
        url::Url::parse(value).map_err(|e| anyhow::anyhow!("{} is not a valid URL: {}", key, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!("{} must start with http:// or https://", key);
    }
    Ok(value.trim_end_matches('/').to_string())
}

/// Splits a comma-separated origin list, dropping blanks.
pub fn parse_cors_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect();
    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}
