use chrono::{FixedOffset, NaiveDateTime, Utc};

use crate::errors::{Error, Result};

/// Wire format for instants: local civil time, no offset suffix.
pub const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parses an instant in the `2025-10-20T12:30:00` wire format.
pub fn parse_instant(raw: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, INSTANT_FORMAT)
}

/// Runtime configuration shared by the CLI and the worker service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Endpoint receiving envelope POSTs
    pub api_url: String,
    /// Unit identifier embedded in every envelope
    pub device_id: String,
    /// Location label embedded in every envelope
    pub location: String,
    /// First instant to send (inclusive); also the baseline for the
    /// cumulative energy counters
    pub start: NaiveDateTime,
    /// Last instant to send (inclusive)
    pub end: NaiveDateTime,
    /// Minutes between data points
    pub interval_minutes: u32,
    /// Pause between sequential requests in milliseconds
    pub pause_ms: u64,
    /// Local-time offset from UTC in minutes, used when deriving "now"
    pub utc_offset_minutes: i32,
}

impl Config {
    /// Rejects configurations that would misbehave mid-transmission.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            return Err(Error::Config("API URL cannot be empty".to_string()));
        }
        if self.device_id.is_empty() {
            return Err(Error::Config("Device ID cannot be empty".to_string()));
        }
        if self.interval_minutes == 0 {
            return Err(Error::Config(
                "Interval must be at least 1 minute".to_string(),
            ));
        }
        if self.end < self.start {
            return Err(Error::Config(format!(
                "End {} is before start {}",
                self.end, self.start
            )));
        }
        if FixedOffset::east_opt(self.utc_offset_minutes * 60).is_none() {
            return Err(Error::Config(format!(
                "UTC offset {} minutes is out of range",
                self.utc_offset_minutes
            )));
        }
        Ok(())
    }

    /// Current civil time under the configured UTC offset.
    pub fn local_now(&self) -> NaiveDateTime {
        match FixedOffset::east_opt(self.utc_offset_minutes * 60) {
            Some(offset) => Utc::now().with_timezone(&offset).naive_local(),
            None => Utc::now().naive_utc(),
        }
    }
}
