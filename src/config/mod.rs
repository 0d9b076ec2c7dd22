use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Placeholder secret used by the development profile only.
pub const DEVELOPMENT_JWT_SECRET: &str = "edenmind-development-secret-do-not-use-in-production";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub ask: AskConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL; `None` selects the in-memory store (development only).
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

/// Upstream chat-completions endpoint used by the AskService.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskConfig {
    pub api_base: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT secret must not be empty")]
    EmptyJwtSecret,

    #[error("JWT_SECRET must be set outside development")]
    DevelopmentSecretOutsideDevelopment,

    #[error("JWT expiry must be at least one hour")]
    ZeroJwtExpiry,

    #[error("DATABASE_URL is required in {0:?}")]
    DatabaseUrlRequired(Environment),
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("EDENMIND_HOST") {
            self.server.host = v;
        }
        if let Some(port) = env::var("EDENMIND_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        // AskService overrides
        if let Ok(v) = env::var("ASK_API_BASE") {
            self.ask.api_base = v;
        }
        if let Ok(v) = env::var("ASK_API_KEY").or_else(|_| env::var("OPENAI_API_KEY")) {
            if !v.trim().is_empty() {
                self.ask.api_key = Some(v);
            }
        }
        if let Ok(v) = env::var("ASK_MODEL") {
            self.ask.model = v;
        }
        if let Ok(v) = env::var("ASK_TIMEOUT_SECS") {
            self.ask.timeout_secs = v.parse().unwrap_or(self.ask.timeout_secs);
        }

        self
    }

    /// Reject combinations that must never reach a running server.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::EmptyJwtSecret);
        }
        if self.environment != Environment::Development
            && self.security.jwt_secret == DEVELOPMENT_JWT_SECRET
        {
            return Err(ConfigError::DevelopmentSecretOutsideDevelopment);
        }
        if self.security.jwt_expiry_hours == 0 {
            return Err(ConfigError::ZeroJwtExpiry);
        }
        if self.environment == Environment::Production && self.database.url.is_none() {
            return Err(ConfigError::DatabaseUrlRequired(self.environment));
        }
        Ok(())
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:4200".to_string()],
                jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24,
            },
            ask: AskConfig {
                api_base: "https://api.openai.com/v1".to_string(),
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 60,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.edenmind.app".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
            ask: AskConfig {
                api_base: "https://api.openai.com/v1".to_string(),
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 30,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://edenmind.app".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 10,
            },
            ask: AskConfig {
                api_base: "https://api.openai.com/v1".to_string(),
                api_key: None,
                model: "gpt-4o-mini".to_string(),
                timeout_secs: 30,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_profile_is_valid_out_of_the_box() {
        let config = AppConfig::development();
        assert_eq!(config.security.jwt_expiry_hours, 24);
        assert!(config.database.url.is_none());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn production_requires_secret_and_database() {
        let mut config = AppConfig::production();
        assert_eq!(config.validate(), Err(ConfigError::EmptyJwtSecret));

        config.security.jwt_secret = DEVELOPMENT_JWT_SECRET.to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::DevelopmentSecretOutsideDevelopment)
        );

        config.security.jwt_secret = "a-real-secret".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::DatabaseUrlRequired(Environment::Production))
        );

        config.database.url = Some("postgres://localhost/edenmind".to_string());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn zero_expiry_is_rejected() {
        let mut config = AppConfig::development();
        config.security.jwt_expiry_hours = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroJwtExpiry));
    }
}
