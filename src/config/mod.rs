use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub security: SecurityConfig,
    pub api: ApiConfig,
    pub reports: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub uri: String,
    pub database: String,
    pub server_selection_timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub access_token_ttl_hours: u64,
    pub refresh_token_ttl_days: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_rate_limiting: bool,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub history_limit: i64,
    pub active_users_limit: i64,
    pub list_limit: i64,
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
        if let Ok(v) = env::var("SERENO_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Store overrides
        if let Ok(v) = env::var("MONGO_URI") {
            self.store.uri = v;
        }
        if let Ok(v) = env::var("MONGO_DB_NAME") {
            self.store.database = v;
        }
        if let Ok(v) = env::var("MONGO_SERVER_SELECTION_TIMEOUT_MS") {
            self.store.server_selection_timeout_ms =
                v.parse().unwrap_or(self.store.server_selection_timeout_ms);
        }
        if let Ok(v) = env::var("MONGO_CONNECT_TIMEOUT_MS") {
            self.store.connect_timeout_ms = v.parse().unwrap_or(self.store.connect_timeout_ms);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_ACCESS_TOKEN_TTL_HOURS") {
            self.security.access_token_ttl_hours =
                v.parse().unwrap_or(self.security.access_token_ttl_hours);
        }
        if let Ok(v) = env::var("SECURITY_REFRESH_TOKEN_TTL_DAYS") {
            self.security.refresh_token_ttl_days =
                v.parse().unwrap_or(self.security.refresh_token_ttl_days);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_RATE_LIMITING") {
            self.api.enable_rate_limiting = v.parse().unwrap_or(self.api.enable_rate_limiting);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_REQUESTS") {
            self.api.rate_limit_requests = v.parse().unwrap_or(self.api.rate_limit_requests);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_WINDOW_SECS") {
            self.api.rate_limit_window_secs =
                v.parse().unwrap_or(self.api.rate_limit_window_secs);
        }

        // Report overrides
        if let Ok(v) = env::var("REPORT_HISTORY_LIMIT") {
            self.reports.history_limit = v.parse().unwrap_or(self.reports.history_limit);
        }
        if let Ok(v) = env::var("REPORT_ACTIVE_USERS_LIMIT") {
            self.reports.active_users_limit =
                v.parse().unwrap_or(self.reports.active_users_limit);
        }
        if let Ok(v) = env::var("REPORT_LIST_LIMIT") {
            self.reports.list_limit = v.parse().unwrap_or(self.reports.list_limit);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 5001 },
            store: StoreConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "sereno_db".to_string(),
                server_selection_timeout_ms: 5000,
                connect_timeout_ms: 5000,
            },
            security: SecurityConfig {
                jwt_secret: "sereno-jwt-secret-dev".to_string(),
                access_token_ttl_hours: 1,
                refresh_token_ttl_days: 30,
            },
            api: ApiConfig {
                enable_rate_limiting: false,
                rate_limit_requests: 1000,
                rate_limit_window_secs: 60,
            },
            reports: ReportConfig {
                history_limit: 50,
                active_users_limit: 10,
                list_limit: 100,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 5001 },
            store: StoreConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "sereno_db".to_string(),
                server_selection_timeout_ms: 5000,
                connect_timeout_ms: 5000,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                access_token_ttl_hours: 1,
                refresh_token_ttl_days: 14,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 200,
                rate_limit_window_secs: 60,
            },
            reports: ReportConfig {
                history_limit: 50,
                active_users_limit: 10,
                list_limit: 100,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 5001 },
            store: StoreConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "sereno_db".to_string(),
                server_selection_timeout_ms: 3000,
                connect_timeout_ms: 3000,
            },
            security: SecurityConfig {
                // Must be supplied via JWT_SECRET; token issuance rejects an empty secret
                jwt_secret: String::new(),
                access_token_ttl_hours: 1,
                refresh_token_ttl_days: 7,
            },
            api: ApiConfig {
                enable_rate_limiting: true,
                rate_limit_requests: 60,
                rate_limit_window_secs: 60,
            },
            reports: ReportConfig {
                history_limit: 50,
                active_users_limit: 10,
                list_limit: 100,
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
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(!config.api.enable_rate_limiting);
        assert_eq!(config.reports.history_limit, 50);
        assert_eq!(config.security.access_token_ttl_hours, 1);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.api.enable_rate_limiting);
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.security.refresh_token_ttl_days, 7);
    }
}
