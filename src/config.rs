use anyhow::Context;
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    /// IANA zone all calendar-day boundaries and display strings use.
    pub business_timezone: Tz,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_clock_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("{key} is not valid"))
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        let tz_name =
            env::var("BUSINESS_TIMEZONE").unwrap_or_else(|_| "Europe/London".to_string());
        let business_timezone: Tz = tz_name
            .parse()
            .map_err(|e: chrono_tz::ParseError| anyhow::anyhow!(e.to_string()))
            .context("BUSINESS_TIMEZONE is not a known IANA zone")?;

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").context("SERVER_ADDR must be set")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            access_token_ttl: env_parsed("ACCESS_TOKEN_TTL", "900")?, // 15 min
            refresh_token_ttl: env_parsed("REFRESH_TOKEN_TTL", "604800")?, // 7 days

            business_timezone,

            rate_login_per_min: env_parsed("RATE_LOGIN_PER_MIN", "60")?,
            rate_clock_per_min: env_parsed("RATE_CLOCK_PER_MIN", "120")?,
            rate_protected_per_min: env_parsed("RATE_PROTECTED_PER_MIN", "1000")?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),
        })
    }
}
