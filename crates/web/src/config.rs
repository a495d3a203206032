//! Helpdesk configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AZURE_AD_CLIENT_ID` - Entra ID application (client) id
//! - `AZURE_AD_CLIENT_SECRET` - Entra ID client secret (placeholder and entropy checked)
//! - `AZURE_AD_TENANT_ID` - Entra ID directory (tenant) id
//! - `HELPDESK_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `HELPDESK_BASE_URL` - Public URL of the helpdesk, used for the OIDC redirect URI
//!
//! ## Optional
//! - `AZURE_AD_AUTHORITY` - Login authority (default: `https://login.microsoftonline.com`)
//! - `HELPDESK_HOST` - Bind address (default: 127.0.0.1)
//! - `HELPDESK_PORT` - Listen port (default: 3000)
//! - `HELPDESK_PAGE_CACHE_TTL_SECS` - Rendered page cache TTL (default: 60)
//! - `HELPDESK_LOG_FORMAT` - `text` or `json` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sample rates (default: 1.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
const DEFAULT_PAGE_CACHE_TTL_SECS: u64 = 60;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines, for local development.
    #[default]
    Text,
    /// One JSON object per event, for log shippers.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'text' or 'json', got '{other}'")),
        }
    }
}

/// Helpdesk application configuration.
#[derive(Debug, Clone)]
pub struct HelpdeskConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL, without a trailing slash
    pub base_url: String,
    /// Entra ID (Azure AD) OIDC configuration
    pub azure: AzureAdConfig,
    /// Time-to-live of rendered pages in the page cache
    pub page_cache_ttl: Duration,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Entra ID (Azure AD) OIDC client configuration.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct AzureAdConfig {
    /// Application (client) id
    pub client_id: String,
    /// Client secret used at the token endpoint
    pub client_secret: SecretString,
    /// Directory (tenant) id
    pub tenant_id: String,
    /// Login authority, without a trailing slash
    pub authority: String,
}

impl std::fmt::Debug for AzureAdConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureAdConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("tenant_id", &self.tenant_id)
            .field("authority", &self.authority)
            .finish()
    }
}

impl AzureAdConfig {
    fn from_source(env: &Env<'_>) -> Result<Self, ConfigError> {
        let authority = env.get_or_default("AZURE_AD_AUTHORITY", DEFAULT_AUTHORITY);
        url::Url::parse(&authority)
            .map_err(|e| ConfigError::InvalidEnvVar("AZURE_AD_AUTHORITY".to_string(), e.to_string()))?;

        Ok(Self {
            client_id: env.required("AZURE_AD_CLIENT_ID")?,
            client_secret: env.validated_secret("AZURE_AD_CLIENT_SECRET")?,
            tenant_id: env.required("AZURE_AD_TENANT_ID")?,
            authority: authority.trim_end_matches('/').to_string(),
        })
    }

    /// OAuth 2.0 authorization endpoint of the tenant.
    #[must_use]
    pub fn authorize_endpoint(&self) -> String {
        format!("{}/{}/oauth2/v2.0/authorize", self.authority, self.tenant_id)
    }

    /// OAuth 2.0 token endpoint of the tenant.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.authority, self.tenant_id)
    }
}

impl HelpdeskConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`HelpdeskConfig::from_env`].
    pub fn from_source(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env { lookup: &lookup };

        let azure = AzureAdConfig::from_source(&env)?;
        let database_url = env.database_url("HELPDESK_DATABASE_URL")?;
        let host = env
            .get_or_default("HELPDESK_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HELPDESK_HOST".to_string(), e.to_string()))?;
        let port = env
            .get_or_default("HELPDESK_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("HELPDESK_PORT".to_string(), e.to_string()))?;

        let base_url = env.required("HELPDESK_BASE_URL")?;
        url::Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("HELPDESK_BASE_URL".to_string(), e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let page_cache_ttl = env
            .optional("HELPDESK_PAGE_CACHE_TTL_SECS")
            .map(|s| {
                s.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "HELPDESK_PAGE_CACHE_TTL_SECS".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?
            .unwrap_or(DEFAULT_PAGE_CACHE_TTL_SECS);

        let log_format = env
            .optional("HELPDESK_LOG_FORMAT")
            .map(|s| {
                s.parse::<LogFormat>()
                    .map_err(|e| ConfigError::InvalidEnvVar("HELPDESK_LOG_FORMAT".to_string(), e))
            })
            .transpose()?
            .unwrap_or_default();

        let sentry_dsn = env.optional("SENTRY_DSN");
        let sentry_environment = env.optional("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = env
            .optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = env
            .optional("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            azure,
            page_cache_ttl: Duration::from_secs(page_cache_ttl),
            log_format,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Redirect URI registered with the identity provider.
    #[must_use]
    pub fn oidc_redirect_uri(&self) -> String {
        oidc_redirect_uri(&self.base_url)
    }
}

/// OIDC callback URL under `base_url` (no trailing slash).
#[must_use]
pub fn oidc_redirect_uri(base_url: &str) -> String {
    format!("{base_url}/api/auth/callback/azure-ad")
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Environment lookup shared by the loaders.
struct Env<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Env<'_> {
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }

    /// Load and validate a secret.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the secret generated by Entra ID."
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const CLIENT_SECRET: &str = "Zq8~vR3kP1xW7mN2bT5yH9cJ4gL6dF0s";

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("AZURE_AD_CLIENT_ID", "0f5c2d4e-helpdesk"),
            ("AZURE_AD_CLIENT_SECRET", CLIENT_SECRET),
            ("AZURE_AD_TENANT_ID", "contoso-tenant"),
            ("HELPDESK_DATABASE_URL", "postgres://localhost/helpdesk"),
            ("HELPDESK_BASE_URL", "https://helpdesk.corp.test/"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<HelpdeskConfig, ConfigError> {
        HelpdeskConfig::from_source(|key| vars.get(key).map(|v| (*v).to_string()))
    }

    #[test]
    fn test_loads_with_defaults() {
        let config = load(&base_vars()).unwrap();

        assert_eq!(config.base_url, "https://helpdesk.corp.test");
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.page_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.azure.authority, DEFAULT_AUTHORITY);
        assert!(config.sentry_dsn.is_none());
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_missing_azure_variable_fails_fast() {
        for key in [
            "AZURE_AD_CLIENT_ID",
            "AZURE_AD_CLIENT_SECRET",
            "AZURE_AD_TENANT_ID",
        ] {
            let mut vars = base_vars();
            vars.remove(key);
            let err = load(&vars).unwrap_err();
            assert!(
                matches!(&err, ConfigError::MissingEnvVar(k) if k == key),
                "unexpected error for {key}: {err}"
            );
        }
    }

    #[test]
    fn test_blank_variable_counts_as_missing() {
        let mut vars = base_vars();
        vars.insert("AZURE_AD_TENANT_ID", "   ");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_database_url_fallback() {
        let mut vars = base_vars();
        vars.remove("HELPDESK_DATABASE_URL");
        vars.insert("DATABASE_URL", "postgres://fallback/helpdesk");
        let config = load(&vars).unwrap();
        assert_eq!(
            config.database_url.expose_secret(),
            "postgres://fallback/helpdesk"
        );

        vars.remove("DATABASE_URL");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::MissingEnvVar(k)) if k == "HELPDESK_DATABASE_URL"
        ));
    }

    #[test]
    fn test_optional_overrides() {
        let mut vars = base_vars();
        vars.insert("HELPDESK_PORT", "8080");
        vars.insert("HELPDESK_HOST", "0.0.0.0");
        vars.insert("HELPDESK_PAGE_CACHE_TTL_SECS", "5");
        vars.insert("HELPDESK_LOG_FORMAT", "JSON");
        vars.insert("AZURE_AD_AUTHORITY", "https://login.microsoftonline.us/");
        let config = load(&vars).unwrap();

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.page_cache_ttl, Duration::from_secs(5));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(
            config.azure.token_endpoint(),
            "https://login.microsoftonline.us/contoso-tenant/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut vars = base_vars();
        vars.insert("HELPDESK_PORT", "not-a-port");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InvalidEnvVar(k, _)) if k == "HELPDESK_PORT"
        ));
    }

    #[test]
    fn test_placeholder_client_secret_is_rejected() {
        let mut vars = base_vars();
        vars.insert("AZURE_AD_CLIENT_SECRET", "your-client-secret-here");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::InsecureSecret(k, _)) if k == "AZURE_AD_CLIENT_SECRET"
        ));
    }

    #[test]
    fn test_endpoints_and_redirect_uri() {
        let config = load(&base_vars()).unwrap();
        assert_eq!(
            config.azure.authorize_endpoint(),
            "https://login.microsoftonline.com/contoso-tenant/oauth2/v2.0/authorize"
        );
        assert_eq!(
            config.oidc_redirect_uri(),
            "https://helpdesk.corp.test/api/auth/callback/azure-ad"
        );
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy(CLIENT_SECRET) > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_azure_config_debug_redacts_secrets() {
        let config = load(&base_vars()).unwrap();
        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("0f5c2d4e-helpdesk"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains(CLIENT_SECRET));
        assert!(!debug_output.contains("postgres://localhost/helpdesk"));
    }
}
