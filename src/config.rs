use std::{env, net::SocketAddr};

use crate::error::AppError;

/// Upper bound for `SESSION_TTL_HOURS`, a hundred years.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365 * 100;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub listen_addr: SocketAddr,
    pub cookie_secret: String,
    pub session_ttl_hours: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://travel.db?mode=rwc".to_string());
        let listen_addr: SocketAddr = env::var("APP_LISTEN_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|err| AppError::Config(format!("invalid APP_LISTEN_ADDR: {err}")))?;

        let cookie_secret = env::var("COOKIE_SECRET")
            .unwrap_or_else(|_| "change-me-travel-planner-cookie-secret".to_string());

        let session_ttl_hours = match env::var("SESSION_TTL_HOURS") {
            Ok(raw) => parse_ttl(&raw)?,
            Err(_) => 24 * 7,
        };

        Ok(Self {
            database_url,
            listen_addr,
            cookie_secret,
            session_ttl_hours,
        })
    }
}

fn parse_ttl(raw: &str) -> Result<i64, AppError> {
    let hours: i64 = raw
        .trim()
        .parse()
        .map_err(|err| AppError::Config(format!("invalid SESSION_TTL_HOURS: {err}")))?;
    if hours <= 0 {
        return Err(AppError::Config(
            "SESSION_TTL_HOURS must be positive".to_string(),
        ));
    }
    if hours > MAX_SESSION_TTL_HOURS {
        return Err(AppError::Config(format!(
            "SESSION_TTL_HOURS must be at most {MAX_SESSION_TTL_HOURS}"
        )));
    }
    Ok(hours)
}

#[cfg(test)]
mod tests {
    use super::{parse_ttl, MAX_SESSION_TTL_HOURS};

    #[test]
    fn ttl_must_be_a_positive_number() {
        assert_eq!(parse_ttl(" 12 ").unwrap(), 12);
        assert!(parse_ttl("0").is_err());
        assert!(parse_ttl("soon").is_err());
        assert_eq!(
            parse_ttl(&MAX_SESSION_TTL_HOURS.to_string()).unwrap(),
            MAX_SESSION_TTL_HOURS
        );
        assert!(parse_ttl(&(MAX_SESSION_TTL_HOURS + 1).to_string()).is_err());
        assert!(parse_ttl("10000000000").is_err());
    }
}
