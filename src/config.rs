use std::env;
use std::time::Duration;

/// One year
const MAX_TOKEN_TTL_HOURS: i64 = 8760;

/// Secret used when JWT_SECRET is unset outside production
const DEV_JWT_SECRET: &str = "campus-market-development-secret-do-not-use";

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub test_before_acquire: bool,
}

/// JWT and session cookie settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub secure_cookies: bool,
}

/// Stripe settings; no secret key means payments run in simulation mode
#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub stripe_secret_key: Option<String>,
    pub stripe_api_base: String,
    pub currency: String,
}

/// Generative-language API settings for the support chatbot
#[derive(Debug, Clone)]
pub struct ChatbotConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub payments: PaymentConfig,
    pub chatbot: ChatbotConfig,
    pub log_level: String,
    pub log_format: String,
    pub http_host: String,
    pub http_port: u16,
    pub environment: String,
    pub audit_log_dir: String,
}

/// Reads a variable and parses it, falling back to `default` when unset or unparsable
fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|s| s.parse::<T>().ok()).unwrap_or(default)
}

/// Treats empty values as unset
fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl DatabaseConfig {
    fn from_lookup<F>(lookup: &F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = non_empty(lookup, "DATABASE_URL")
            .ok_or("DATABASE_URL environment variable is required")?;

        let max_connections = parse_or(lookup, "DATABASE_MAX_CONNECTIONS", 10u32);
        let acquire_timeout_secs = parse_or(lookup, "DATABASE_ACQUIRE_TIMEOUT_SECS", 30u64);
        let idle_timeout_secs = parse_or(lookup, "DATABASE_IDLE_TIMEOUT_SECS", 600u64); // 10 minutes
        let max_lifetime_secs = parse_or(lookup, "DATABASE_MAX_LIFETIME_SECS", 1800u64); // 30 minutes
        let test_before_acquire = parse_or(lookup, "DATABASE_TEST_BEFORE_ACQUIRE", true);

        if max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be greater than 0".to_string());
        }

        if acquire_timeout_secs == 0 {
            return Err("DATABASE_ACQUIRE_TIMEOUT_SECS must be greater than 0".to_string());
        }

        Ok(Self {
            url,
            max_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
            test_before_acquire,
        })
    }

    /// Get acquire timeout as Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Get idle timeout as Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Get max lifetime as Duration
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost/campus_market".to_string(),
            max_connections: 10,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
            test_before_acquire: true,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
            secure_cookies: false,
        }
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_secret_key: None,
            stripe_api_base: "https://api.stripe.com/v1".to_string(),
            currency: "usd".to_string(),
        }
    }
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ChatbotConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AppConfig {
    /// Create application config from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(&|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the environment in production)
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = DatabaseConfig::from_lookup(lookup)?;

        let log_level = lookup("LOG_LEVEL")
            .unwrap_or_else(|| "info".to_string())
            .to_lowercase();

        let log_format = lookup("LOG_FORMAT")
            .unwrap_or_else(|| "pretty".to_string())
            .to_lowercase();

        let http_host = lookup("HTTP_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let http_port = parse_or(lookup, "HTTP_PORT", 5000u16);

        let environment = lookup("ENVIRONMENT")
            .unwrap_or_else(|| "development".to_string())
            .to_lowercase();

        // Validate log level
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&log_level.as_str()) {
            return Err(format!(
                "Invalid LOG_LEVEL: {}. Must be one of: {:?}",
                log_level, valid_log_levels
            ));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&log_format.as_str()) {
            return Err(format!(
                "Invalid LOG_FORMAT: {}. Must be one of: {:?}",
                log_format, valid_log_formats
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&environment.as_str()) {
            return Err(format!(
                "Invalid ENVIRONMENT: {}. Must be one of: {:?}",
                environment, valid_environments
            ));
        }

        let is_production = environment == "production";

        let jwt_secret = match non_empty(lookup, "JWT_SECRET") {
            Some(secret) => secret,
            None if is_production => {
                return Err("JWT_SECRET is required in production".to_string());
            }
            None => DEV_JWT_SECRET.to_string(),
        };

        if is_production && jwt_secret.len() < 32 {
            return Err("JWT_SECRET must be at least 32 characters in production".to_string());
        }

        let token_ttl_hours = parse_or(lookup, "TOKEN_TTL_HOURS", 24i64);
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&token_ttl_hours) {
            return Err(format!(
                "TOKEN_TTL_HOURS must be between 1 and {}",
                MAX_TOKEN_TTL_HOURS
            ));
        }

        let auth = AuthConfig {
            jwt_secret,
            token_ttl_hours,
            secure_cookies: is_production,
        };

        let payment_defaults = PaymentConfig::default();
        let payments = PaymentConfig {
            stripe_secret_key: non_empty(lookup, "STRIPE_SECRET_KEY"),
            stripe_api_base: non_empty(lookup, "STRIPE_API_BASE")
                .unwrap_or(payment_defaults.stripe_api_base),
            currency: non_empty(lookup, "PAYMENT_CURRENCY")
                .map(|c| c.to_lowercase())
                .unwrap_or(payment_defaults.currency),
        };

        let chatbot_defaults = ChatbotConfig::default();
        let chatbot = ChatbotConfig {
            api_url: non_empty(lookup, "CHATBOT_API_URL").unwrap_or(chatbot_defaults.api_url),
            api_key: non_empty(lookup, "CHATBOT_API_KEY"),
            model: non_empty(lookup, "CHATBOT_MODEL").unwrap_or(chatbot_defaults.model),
            timeout_secs: parse_or(lookup, "CHATBOT_TIMEOUT_SECS", chatbot_defaults.timeout_secs),
        };

        let audit_log_dir = lookup("AUDIT_LOG_DIR").unwrap_or_else(|| "./logs".to_string());

        Ok(Self {
            database,
            auth,
            payments,
            chatbot,
            log_level,
            log_format,
            http_host,
            http_port,
            environment,
            audit_log_dir,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            payments: PaymentConfig::default(),
            chatbot: ChatbotConfig::default(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            http_host: "0.0.0.0".to_string(),
            http_port: 5000,
            environment: "development".to_string(),
            audit_log_dir: "./logs".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout_secs, 30);
    }

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.http_port, 5000);
        assert_eq!(config.environment, "development");
        assert!(!config.is_production());
        assert!(config.payments.stripe_secret_key.is_none());
    }

    #[test]
    fn test_database_url_required() {
        let lookup = lookup_from(&[]);
        let err = AppConfig::from_lookup(&lookup).unwrap_err();
        assert!(err.contains("DATABASE_URL"));
    }

    #[test]
    fn test_minimal_development_config() {
        let lookup = lookup_from(&[("DATABASE_URL", "postgres://localhost/market")]);
        let config = AppConfig::from_lookup(&lookup).unwrap();

        assert_eq!(config.database.url, "postgres://localhost/market");
        assert_eq!(config.auth.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert!(!config.auth.secure_cookies);
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert!(config.chatbot.api_key.is_none());
    }

    #[test]
    fn test_production_requires_strong_secret() {
        let lookup = lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/market"),
            ("ENVIRONMENT", "production"),
        ]);
        assert!(AppConfig::from_lookup(&lookup).is_err());

        let lookup = lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/market"),
            ("ENVIRONMENT", "production"),
            ("JWT_SECRET", "short"),
        ]);
        assert!(AppConfig::from_lookup(&lookup).is_err());

        let lookup = lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/market"),
            ("ENVIRONMENT", "Production"),
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
        ]);
        let config = AppConfig::from_lookup(&lookup).unwrap();
        assert!(config.is_production());
        assert!(config.auth.secure_cookies);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let lookup = lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/market"),
            ("LOG_LEVEL", "verbose"),
        ]);
        assert!(AppConfig::from_lookup(&lookup).is_err());

        let lookup = lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/market"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
        ]);
        assert!(AppConfig::from_lookup(&lookup).is_err());

        let lookup = lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/market"),
            ("TOKEN_TTL_HOURS", "-1"),
        ]);
        assert!(AppConfig::from_lookup(&lookup).is_err());

        let lookup = lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/market"),
            ("TOKEN_TTL_HOURS", "9223372036854775807"),
        ]);
        let err = AppConfig::from_lookup(&lookup).unwrap_err();
        assert!(err.contains("TOKEN_TTL_HOURS"));

        let lookup = lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/market"),
            ("TOKEN_TTL_HOURS", "8760"),
        ]);
        assert_eq!(AppConfig::from_lookup(&lookup).unwrap().auth.token_ttl_hours, 8760);
    }

    #[test]
    fn test_blank_optional_keys_are_unset() {
        let lookup = lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/market"),
            ("STRIPE_SECRET_KEY", "  "),
            ("CHATBOT_API_KEY", ""),
            ("PAYMENT_CURRENCY", "EUR"),
        ]);
        let config = AppConfig::from_lookup(&lookup).unwrap();
        assert!(config.payments.stripe_secret_key.is_none());
        assert!(config.chatbot.api_key.is_none());
        assert_eq!(config.payments.currency, "eur");
    }
}
