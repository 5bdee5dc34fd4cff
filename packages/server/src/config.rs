use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Places text-search API key. Optional: without it job starts are
    /// rejected with a configuration error, but the server still boots.
    pub places_api_key: Option<String>,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    /// Subjects (user ids) that hold the admin role.
    pub admin_identifiers: Vec<String>,
    /// Extra email domains to blocklist on top of the built-in consumer set.
    pub email_domain_blocklist: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            places_api_key: env::var("PLACES_API_KEY").ok().filter(|k| !k.is_empty()),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "leadscout".to_string()),
            admin_identifiers: parse_list(env::var("ADMIN_IDENTIFIERS").ok()),
            email_domain_blocklist: parse_list(env::var("EMAIL_DOMAIN_BLOCKLIST").ok()),
        })
    }
}

fn parse_list(value: Option<String>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
