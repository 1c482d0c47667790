use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Sales tax applied on top of the cart subtotal.
pub const DEFAULT_TAX_RATE: &str = "0.13";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub tax_rate: Decimal,
    pub guest_cart_dir: PathBuf,
    pub menu_path: Option<PathBuf>,
    /// How long a browser's cart stays in memory without requests.
    pub cart_idle_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "menucart".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "menucart-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        let tax_rate = parse_tax_rate(
            &std::env::var("TAX_RATE").unwrap_or_else(|_| DEFAULT_TAX_RATE.into()),
        )?;
        let guest_cart_dir = std::env::var("GUEST_CART_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./guest-carts"));
        let menu_path = std::env::var("MENU_PATH").ok().map(PathBuf::from);
        let cart_idle_minutes = std::env::var("CART_IDLE_MINUTES")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        Ok(Self {
            database_url,
            jwt,
            tax_rate,
            guest_cart_dir,
            menu_path,
            cart_idle_timeout: Duration::from_secs(cart_idle_minutes * 60),
        })
    }
}

fn parse_tax_rate(raw: &str) -> anyhow::Result<Decimal> {
    let rate = Decimal::from_str(raw.trim()).with_context(|| format!("invalid TAX_RATE {raw:?}"))?;
    anyhow::ensure!(
        rate >= Decimal::ZERO && rate < Decimal::ONE,
        "TAX_RATE must be in [0, 1), got {rate}"
    );
    Ok(rate)
}
