use std::env;
use std::time::Duration;

use chrono_tz::Tz;

use crate::error::AppError;
use crate::geo::distance::{DEFAULT_FALLBACK_SPEED_KMH, DEFAULT_ROUTING_TIMEOUT};

pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub routing_base_url: String,
    pub routing_profile: String,
    pub routing_timeout: Duration,
    pub fallback_speed_kmh: f64,
    pub timezone: Tz,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let fallback_speed_kmh: f64 = parse_or_default("FALLBACK_SPEED_KMH", DEFAULT_FALLBACK_SPEED_KMH)?;
        if !(fallback_speed_kmh.is_finite() && fallback_speed_kmh > 0.0) {
            return Err(AppError::Internal(
                "invalid FALLBACK_SPEED_KMH: must be > 0".to_string(),
            ));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: parse_log_format(&env::var("LOG_FORMAT").unwrap_or_default()),
            routing_base_url: env::var("ROUTING_BASE_URL")
                .unwrap_or_else(|_| "https://router.project-osrm.org".to_string()),
            routing_profile: env::var("ROUTING_PROFILE").unwrap_or_else(|_| "driving".to_string()),
            routing_timeout: Duration::from_secs(parse_or_default(
                "ROUTING_TIMEOUT_SECS",
                DEFAULT_ROUTING_TIMEOUT.as_secs(),
            )?),
            fallback_speed_kmh,
            timezone: startup_timezone(
                &env::var("DELIVERY_TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string()),
            )?,
        })
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz, AppError> {
    name.parse::<Tz>()
        .map_err(|err| AppError::BadRequest(format!("unknown timezone {name}: {err}")))
}

/// A bad configured timezone is a startup failure, not a caller error.
fn startup_timezone(name: &str) -> Result<Tz, AppError> {
    parse_timezone(name)
        .map_err(|err| AppError::Internal(format!("invalid DELIVERY_TIMEZONE: {err}")))
}

fn parse_log_format(raw: &str) -> LogFormat {
    if raw.eq_ignore_ascii_case("json") {
        LogFormat::Json
    } else {
        LogFormat::Compact
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_log_format, parse_timezone, startup_timezone, LogFormat};
    use crate::error::AppError;

    #[test]
    fn parses_iana_timezones() {
        assert!(parse_timezone("Asia/Kolkata").is_ok());
        assert!(parse_timezone("Mars/Olympus_Mons").is_err());
    }

    #[test]
    fn log_format_defaults_to_compact() {
        assert_eq!(parse_log_format(""), LogFormat::Compact);
        assert_eq!(parse_log_format("JSON"), LogFormat::Json);
    }

    #[test]
    fn bad_configured_timezone_fails_startup_as_internal() {
        let err = startup_timezone("Mars/Olympus_Mons").unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert!(err.to_string().contains("DELIVERY_TIMEZONE"));

        assert_eq!(startup_timezone("Asia/Kolkata").unwrap().name(), "Asia/Kolkata");
    }
}
