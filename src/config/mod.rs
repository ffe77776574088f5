use chrono::{DateTime, NaiveDate, Utc};
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/dinner_club";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub production: bool,
    /// Ratings of other users stay hidden until this instant.
    pub ratings_reveal_date: Option<DateTime<Utc>>,
}

impl Config {
    pub fn from_env() -> Self {
        let host = env::var("HOST")
            .ok()
            .and_then(|h| h.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let ratings_reveal_date = env::var("RATINGS_REVEAL_DATE")
            .ok()
            .and_then(|raw| match parse_reveal_date(&raw) {
                Some(date) => Some(date),
                None => {
                    tracing::warn!(value = %raw, "Ignoring unparsable RATINGS_REVEAL_DATE");
                    None
                }
            });

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            bind_addr: SocketAddr::new(host, port),
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            production: env::var("RUST_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            ratings_reveal_date,
        }
    }

    /// Whether other users' ratings are hidden at `now`.
    pub fn ratings_hidden_at(&self, now: DateTime<Utc>) -> bool {
        self.ratings_reveal_date
            .map(|reveal| now < reveal)
            .unwrap_or(false)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            production: false,
            ratings_reveal_date: None,
        }
    }
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_reveal_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_reveal_date_formats() {
        assert_eq!(
            parse_reveal_date("2025-03-01"),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_reveal_date("2025-03-01T18:30:00+01:00"),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 17, 30, 0).unwrap())
        );
        assert_eq!(parse_reveal_date(""), None);
        assert_eq!(parse_reveal_date("next tuesday"), None);
    }

    #[test]
    fn test_ratings_hidden_only_before_reveal() {
        let reveal = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let config = Config {
            ratings_reveal_date: Some(reveal),
            ..Config::default()
        };
        assert!(config.ratings_hidden_at(Utc.with_ymd_and_hms(2025, 5, 31, 23, 59, 59).unwrap()));
        assert!(!config.ratings_hidden_at(reveal));
        assert!(!config.ratings_hidden_at(Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_ratings_visible_without_reveal_date() {
        assert!(!Config::default().ratings_hidden_at(Utc::now()));
    }
}
