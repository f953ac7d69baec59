use anyhow::{Context, Result};
use simplelog::LevelFilter;
use std::{env, net::SocketAddr};

// Settings read once from the environment at start-up
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub token_duration: i64,
    pub listen_addr: SocketAddr,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET").context("$JWT_SECRET is not set")?;
        let token_duration = lookup("TOKEN_DURATION")
            .context("$TOKEN_DURATION is not set")?
            .parse::<i64>()
            .context("$TOKEN_DURATION is not numeric")?;
        let listen_addr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .context("$LISTEN_ADDR is not a socket address")?;
        let log_level = match lookup("LOG_LEVEL") {
            Some(level) => level
                .parse::<LevelFilter>()
                .map_err(|_| anyhow::anyhow!("$LOG_LEVEL '{}' is not a log level", level))?,
            None => LevelFilter::Debug,
        };

        Ok(Config {
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            jwt_secret,
            token_duration,
            listen_addr,
            log_level,
        })
    }
}
