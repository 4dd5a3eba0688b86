use iam_core::error::AppError;
use serde::Deserialize;
use std::env;

/// Process-wide configuration, loaded once at startup from the environment
/// (with an optional `.env` file merged in by `dotenvy`).
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub port: u16,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub session: SessionConfig,
    pub login_security: LoginSecurityConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

/// Session lifetime and token bookkeeping. `signing_key` is carried for a
/// future external collaborator that mints signed/JWT session fronts; the
/// core itself authenticates sessions as opaque Store-backed tokens (see
/// the session manager) and never parses this key.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub signing_key: String,
    pub default_lifetime_seconds: i64,
    pub last_used_touch_interval_seconds: i64,
    pub sweep_interval_seconds: u64,
    pub password_reset_ttl_seconds: i64,
    pub email_verification_ttl_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginSecurityConfig {
    pub failed_login_threshold: u32,
    pub base_backoff_seconds: i64,
    pub max_backoff_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window_seconds: u64,
    pub global_ip_limit: u32,
    pub global_ip_window_seconds: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::validation(e))?;

        let is_prod = environment == Environment::Prod;

        let config = AppConfig {
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("iam-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            port: get_env("PORT", Some("8080"), is_prod)?
                .parse()
                .map_err(|e: std::num::ParseIntError| AppError::validation(e.to_string()))?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: get_env("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
                min_connections: get_env("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?
                    .parse()
                    .unwrap_or(1),
            },
            redis: RedisConfig {
                url: get_env("REDIS_URL", None, is_prod)?,
            },
            session: SessionConfig {
                signing_key: get_env("SESSION_SIGNING_KEY", Some(""), is_prod)?,
                default_lifetime_seconds: get_env(
                    "SESSION_DEFAULT_LIFETIME_SECONDS",
                    Some("86400"),
                    is_prod,
                )?
                .parse()
                .map_err(|e: std::num::ParseIntError| AppError::validation(e.to_string()))?,
                last_used_touch_interval_seconds: get_env(
                    "SESSION_LAST_USED_TOUCH_INTERVAL_SECONDS",
                    Some("60"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(60),
                sweep_interval_seconds: get_env("SESSION_SWEEP_INTERVAL_SECONDS", Some("300"), is_prod)?
                    .parse()
                    .unwrap_or(300),
                password_reset_ttl_seconds: get_env(
                    "PASSWORD_RESET_TTL_SECONDS",
                    Some("3600"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(3600),
                email_verification_ttl_seconds: get_env(
                    "EMAIL_VERIFICATION_TTL_SECONDS",
                    Some("86400"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(86400),
            },
            login_security: LoginSecurityConfig {
                failed_login_threshold: get_env("FAILED_LOGIN_THRESHOLD", Some("5"), is_prod)?
                    .parse()
                    .unwrap_or(5),
                base_backoff_seconds: get_env("LOGIN_BASE_BACKOFF_SECONDS", Some("30"), is_prod)?
                    .parse()
                    .unwrap_or(30),
                max_backoff_seconds: get_env("LOGIN_MAX_BACKOFF_SECONDS", Some("3600"), is_prod)?
                    .parse()
                    .unwrap_or(3600),
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .collect(),
            },
            rate_limit: RateLimitConfig {
                login_attempts: get_env("RATE_LIMIT_LOGIN_ATTEMPTS", Some("5"), is_prod)?
                    .parse()
                    .unwrap_or(5),
                login_window_seconds: get_env(
                    "RATE_LIMIT_LOGIN_WINDOW_SECONDS",
                    Some("900"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(900),
                global_ip_limit: get_env("RATE_LIMIT_GLOBAL_IP_LIMIT", Some("100"), is_prod)?
                    .parse()
                    .unwrap_or(100),
                global_ip_window_seconds: get_env(
                    "RATE_LIMIT_GLOBAL_IP_WINDOW_SECONDS",
                    Some("60"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(60),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.port == 0 {
            return Err(AppError::validation("PORT must be greater than 0"));
        }

        if self.session.default_lifetime_seconds <= 0 {
            return Err(AppError::validation(
                "SESSION_DEFAULT_LIFETIME_SECONDS must be positive",
            ));
        }

        if self.environment == Environment::Prod
            && self.security.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(AppError::validation(
                "wildcard CORS origin not allowed in production",
            ));
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::validation(format!(
                    "{key} is required in production but not set"
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::validation(format!(
                    "{key} is required but not set"
                )))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("invalid environment: {s}")),
        }
    }
}
