use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api_server: ServerConfig,
    pub redirect_server: ServerConfig,
    /// Base URL used to build the short links returned by the API,
    /// normally the public address of the redirect server.
    pub public_base_url: String,
    pub auth: AuthConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret for verifying bearer tokens.
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Path to a MaxMind MMDB file; geolocation degrades to "Unknown"
    /// when unset.
    pub geoip_db_path: Option<String>,
    /// Whether X-Forwarded-For may be believed. Only enable behind a
    /// trusted proxy layer; the header is client-controllable otherwise.
    pub trust_forwarded_headers: bool,
}

fn env_bool(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./shrinker.db".to_string());
        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let redirect_host =
            std::env::var("REDIRECT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let redirect_port = std::env::var("REDIRECT_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()?;

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", redirect_host, redirect_port));

        let secret = match std::env::var("AUTH_SECRET") {
            Ok(secret) => secret,
            Err(_) => {
                tracing::warn!(
                    "AUTH_SECRET is not set, using an insecure development secret"
                );
                "insecure-dev-secret".to_string()
            }
        };

        let geoip_db_path = std::env::var("GEOIP_DB_PATH").ok();
        let trust_forwarded_headers = env_bool("TRUST_FORWARDED_HEADERS");

        Ok(Config {
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            redirect_server: ServerConfig {
                host: redirect_host,
                port: redirect_port,
            },
            public_base_url,
            auth: AuthConfig { secret },
            analytics: AnalyticsConfig {
                geoip_db_path,
                trust_forwarded_headers,
            },
        })
    }
}
