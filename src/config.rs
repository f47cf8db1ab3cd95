use std::env;
use std::path::PathBuf;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub dispatch: DispatchConfig,
    pub seed_path: Option<PathBuf>,
}

/// Upper bound for configured and seeded durations: one leap year.
pub const MAX_DURATION_SECS: i64 = 366 * 86_400;

/// Knobs of the dispatch engine. Distances are haversine kilometres.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub eligibility_radius_km: f64,
    pub acceptance_radius_km: f64,
    pub max_orders_per_trip: i64,
    pub pool_entry_ttl_secs: i64,
    pub expiry_sweep_interval_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            eligibility_radius_km: 50.0,
            acceptance_radius_km: 10.0,
            max_orders_per_trip: 5,
            pool_entry_ttl_secs: 86_400,
            expiry_sweep_interval_secs: 60,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.eligibility_radius_km > 0.0 && self.acceptance_radius_km > 0.0) {
            return Err(AppError::Internal(
                "radius settings must be positive".to_string(),
            ));
        }
        if !(0..=MAX_DURATION_SECS).contains(&self.pool_entry_ttl_secs) {
            return Err(AppError::Internal(format!(
                "POOL_ENTRY_TTL_SECS must be between 0 and {MAX_DURATION_SECS}"
            )));
        }
        Ok(())
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = DispatchConfig::default();

        let dispatch = DispatchConfig {
            eligibility_radius_km: parse_or_default(
                "ELIGIBILITY_RADIUS_KM",
                defaults.eligibility_radius_km,
            )?,
            acceptance_radius_km: parse_or_default(
                "ACCEPTANCE_RADIUS_KM",
                defaults.acceptance_radius_km,
            )?,
            max_orders_per_trip: parse_or_default(
                "MAX_ORDERS_PER_TRIP",
                defaults.max_orders_per_trip,
            )?,
            pool_entry_ttl_secs: parse_or_default(
                "POOL_ENTRY_TTL_SECS",
                defaults.pool_entry_ttl_secs,
            )?,
            expiry_sweep_interval_secs: parse_or_default(
                "EXPIRY_SWEEP_INTERVAL_SECS",
                defaults.expiry_sweep_interval_secs,
            )?,
        };

        dispatch.validate()?;

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            dispatch,
            seed_path: env::var("SEED_PATH").ok().map(PathBuf::from),
        })
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
