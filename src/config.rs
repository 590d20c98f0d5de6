use std::env;
use std::net::SocketAddr;

use anyhow::Context;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";
const FALLBACK_SECRET: &str = "fallback_secret_do_not_use_in_production";

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    /// Postgres URL. Without one the portal runs on the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub secure_cookies: bool,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let addr = var("PORTAL_ADDR").unwrap_or_else(|| {
            log::info!("PORTAL_ADDR not set, using default: {}", DEFAULT_ADDR);
            DEFAULT_ADDR.to_string()
        });
        let addr = addr
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid PORTAL_ADDR value `{}`", addr))?;

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            log::warn!("JWT_SECRET not set, signing sessions with the fallback secret");
            FALLBACK_SECRET.to_string()
        });

        let secure_cookies = matches!(var("PORTAL_ENV").as_deref(), Some("production"));

        Ok(Self {
            addr,
            database_url: var("DATABASE_URL"),
            jwt_secret,
            secure_cookies,
        })
    }
}
