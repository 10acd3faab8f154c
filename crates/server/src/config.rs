//! Process configuration read from the environment.

use anyhow::Context;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_DATABASE_URL: &str = "sqlite://buentiempo.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub weatherapi_key: String,
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().context("PORT is not a valid port number")?,
            Err(_) => DEFAULT_PORT,
        };
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let weatherapi_key = std::env::var("WEATHERAPI_API_KEY")
            .context("WEATHERAPI_API_KEY environment variable not set")?;
        let jwt_secret =
            std::env::var("JWT_SECRET").context("JWT_SECRET environment variable not set")?;

        Ok(Self {
            port,
            database_url,
            weatherapi_key,
            jwt_secret,
        })
    }
}
