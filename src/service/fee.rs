use crate::config::PricingConfig;
use crate::error::app_error::AppError;
use chrono::{DateTime, Utc};

const MILLIS_PER_MINUTE: i64 = 60_000;
const MINUTES_PER_HOUR: i64 = 60;

/// Tariff applied when a car leaves: free up to `free_minutes`, then every
/// started hour costs `hourly_rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub hourly_rate: i64,
    pub free_minutes: i64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            hourly_rate: 5,
            free_minutes: 15,
        }
    }
}

impl From<&PricingConfig> for FeeSchedule {
    fn from(config: &PricingConfig) -> Self {
        Self {
            hourly_rate: config.hourly_rate,
            free_minutes: config.free_minutes,
        }
    }
}

/// Whole minutes between entry and exit, rounded up.
pub fn elapsed_minutes(entry_time: DateTime<Utc>, exit_time: DateTime<Utc>) -> Result<i64, AppError> {
    let millis = (exit_time - entry_time).num_milliseconds();
    if millis < 0 {
        return Err(AppError::InvalidInterval);
    }
    Ok((millis + MILLIS_PER_MINUTE - 1) / MILLIS_PER_MINUTE)
}

impl FeeSchedule {
    pub fn fee_for_minutes(&self, minutes: i64) -> i64 {
        if minutes <= self.free_minutes {
            return 0;
        }
        let hours = (minutes + MINUTES_PER_HOUR - 1) / MINUTES_PER_HOUR;
        hours * self.hourly_rate
    }

    /// Duration in minutes and the fee owed for a stay.
    pub fn quote(&self, entry_time: DateTime<Utc>, exit_time: DateTime<Utc>) -> Result<(i64, i64), AppError> {
        let minutes = elapsed_minutes(entry_time, exit_time)?;
        Ok((minutes, self.fee_for_minutes(minutes)))
    }
}
