use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use url::Url;

/// Errors raised while reading configuration at start-up
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub supabase: SupabaseConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub project_name: String,
    /// Path prefix for every versioned route, e.g. `/api/v1`
    pub prefix: String,
    pub host: String,
    pub port: u16,
    pub max_list_limit: usize,
}

/// Connection settings for the hosted database-and-auth platform
#[derive(Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    pub url: Url,
    pub api_key: String,
    pub service_role_key: Option<String>,
    pub items_table: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,
    pub allow_anonymous_read: bool,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub default_filter: String,
}

// Keys and secrets stay out of Debug output so the config can be logged.
impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("api_key", &"<redacted>")
            .field("service_role_key", &self.service_role_key.as_ref().map(|_| "<redacted>"))
            .field("items_table", &self.items_table)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_audience", &self.jwt_audience)
            .field("allow_anonymous_read", &self.allow_anonymous_read)
            .field("enable_cors", &self.enable_cors)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

/// Presets that differ per environment; everything else is read from env vars.
struct Preset {
    environment: Environment,
    timeout_secs: u64,
    max_list_limit: usize,
    log_format: LogFormat,
    default_filter: &'static str,
}

impl Preset {
    fn development() -> Self {
        Self {
            environment: Environment::Development,
            timeout_secs: 30,
            max_list_limit: 1000,
            log_format: LogFormat::Text,
            default_filter: "items_api=debug,tower_http=debug",
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            timeout_secs: 15,
            max_list_limit: 500,
            log_format: LogFormat::Json,
            default_filter: "items_api=info,tower_http=info",
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            timeout_secs: 10,
            max_list_limit: 100,
            log_format: LogFormat::Json,
            default_filter: "items_api=info,tower_http=warn",
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (used by tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let preset = match get("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Preset::production(),
            Some("staging") | Some("stage") => Preset::staging(),
            _ => Preset::development(),
        };

        let raw_url = get("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let url = Url::parse(&raw_url).map_err(|e| ConfigError::Invalid {
            key: "SUPABASE_URL",
            message: e.to_string(),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Invalid {
                key: "SUPABASE_URL",
                message: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let api_key = get("SUPABASE_KEY").ok_or(ConfigError::Missing("SUPABASE_KEY"))?;
        let jwt_secret =
            get("SUPABASE_JWT_SECRET").ok_or(ConfigError::Missing("SUPABASE_JWT_SECRET"))?;

        let max_list_limit = parse_or(&get, "ITEMS_MAX_LIMIT", preset.max_list_limit)?;
        if max_list_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "ITEMS_MAX_LIMIT",
                message: "must be at least 1".to_string(),
            });
        }

        let timeout_secs = parse_or(&get, "SUPABASE_TIMEOUT_SECS", preset.timeout_secs)?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "SUPABASE_TIMEOUT_SECS",
                message: "must be at least 1".to_string(),
            });
        }

        let log_format = match get("LOG_FORMAT").as_deref() {
            None => preset.log_format,
            Some("json") => LogFormat::Json,
            Some("text") | Some("pretty") => LogFormat::Text,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "LOG_FORMAT",
                    message: format!("expected 'text' or 'json', got '{}'", other),
                })
            }
        };

        let cors_origins = get("BACKEND_CORS_ORIGINS")
            .map(|v| parse_cors_origins(&v))
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            environment: preset.environment,
            api: ApiConfig {
                project_name: get("PROJECT_NAME").unwrap_or_else(|| "Items API".to_string()),
                prefix: normalize_prefix(get("API_V1_STR").as_deref().unwrap_or("/api/v1")),
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&get, "PORT", 8000)?,
                max_list_limit,
            },
            supabase: SupabaseConfig {
                url,
                api_key,
                service_role_key: get("SUPABASE_SERVICE_ROLE_KEY"),
                items_table: get("SUPABASE_ITEMS_TABLE").unwrap_or_else(|| "items".to_string()),
                timeout_secs,
            },
            security: SecurityConfig {
                jwt_secret,
                jwt_audience: get("SUPABASE_JWT_AUDIENCE"),
                allow_anonymous_read: parse_or(&get, "ALLOW_ANONYMOUS_READ", false)?,
                enable_cors: parse_or(&get, "ENABLE_CORS", true)?,
                cors_origins,
            },
            logging: LoggingConfig {
                format: log_format,
                default_filter: preset.default_filter.to_string(),
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

fn parse_or<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
    }
}

/// Accepts either `a,b,c` or a JSON array `["a","b"]`
fn parse_cors_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    if raw.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(raw).map_err(|e| ConfigError::Invalid {
            key: "BACKEND_CORS_ORIGINS",
            message: e.to_string(),
        });
    }

    Ok(raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("SUPABASE_URL", "https://project.supabase.co"),
        ("SUPABASE_KEY", "anon-key"),
        ("SUPABASE_JWT_SECRET", "super-secret"),
    ];

    #[test]
    fn test_required_values_produce_development_defaults() {
        let config = AppConfig::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.api.prefix, "/api/v1");
        assert_eq!(config.api.port, 8000);
        assert_eq!(config.supabase.items_table, "items");
        assert!(!config.security.allow_anonymous_read);
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_each_required_variable_is_enforced() {
        for missing in ["SUPABASE_URL", "SUPABASE_KEY", "SUPABASE_JWT_SECRET"] {
            let pairs: Vec<(&str, &str)> = REQUIRED
                .iter()
                .copied()
                .filter(|(k, _)| *k != missing)
                .collect();
            let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(matches!(err, ConfigError::Missing(key) if key == missing));
        }
    }

    #[test]
    fn test_blank_secret_counts_as_missing() {
        let mut pairs = REQUIRED.to_vec();
        pairs[2] = ("SUPABASE_JWT_SECRET", "   ");
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SUPABASE_JWT_SECRET")));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let mut pairs = REQUIRED.to_vec();
        pairs[0] = ("SUPABASE_URL", "ftp://example.com");
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SUPABASE_URL", .. }));
    }

    #[test]
    fn test_production_preset_and_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("APP_ENV", "production"),
            ("PORT", "9090"),
            ("API_V1_STR", "api/v2/"),
            ("ALLOW_ANONYMOUS_READ", "true"),
        ]);
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert!(config.is_production());
        assert_eq!(config.api.port, 9090);
        assert_eq!(config.api.prefix, "/api/v2");
        assert_eq!(config.api.max_list_limit, 100);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.security.allow_anonymous_read);
    }

    #[test]
    fn test_invalid_port_is_reported() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "eighty"));
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        for key in ["SUPABASE_TIMEOUT_SECS", "ITEMS_MAX_LIMIT"] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push((key, "0"));
            let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { key: k, .. } if k == key));
        }
    }

    #[test]
    fn test_cors_origins_accept_list_and_json() {
        assert_eq!(
            parse_cors_origins("http://a.test, http://b.test").unwrap(),
            vec!["http://a.test", "http://b.test"]
        );
        assert_eq!(
            parse_cors_origins(r#"["http://a.test"]"#).unwrap(),
            vec!["http://a.test"]
        );
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let config = AppConfig::from_lookup(lookup(REQUIRED)).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("anon-key"));
    }
}
