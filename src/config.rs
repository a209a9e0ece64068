use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: Secret<String>,

    /// Maximum size of the Postgres connection pool.
    pub max_connections: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Ok(Self {
            database_url: Secret::new(config.get("database_url")?),
            max_connections: config.get("max_connections").unwrap_or(5),
        })
    }

    pub fn database_url(&self) -> &str {
        self.database_url.expose_secret()
    }
}
