use std::{fmt, str::FromStr, time::Duration};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::AppError;

// Accepts "HH:MM:SS", the TimeSpan day form "D.HH:MM:SS" and a fractional tail.
static TIME_SPAN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+)\.)?(\d{1,2}):([0-5]\d):([0-5]\d)(?:\.\d+)?$")
        .expect("TIME_SPAN_REGEX is a valid regex pattern")
});

/// A whole-second duration carried on the wire as `HH:MM:SS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeLimit(u64);

impl TimeLimit {
    pub fn from_secs(secs: u64) -> Self {
        TimeLimit(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl FromStr for TimeLimit {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::ValidationError(format!("Invalid time limit '{}'", value));

        let captures = TIME_SPAN_REGEX.captures(value.trim()).ok_or_else(invalid)?;
        let field = |idx: usize| -> Result<u64, AppError> {
            captures
                .get(idx)
                .map_or(Ok(0), |m| m.as_str().parse::<u64>().map_err(|_| invalid()))
        };

        let days = field(1)?;
        let hours = field(2)?;
        if captures.get(1).is_some() && hours > 23 {
            return Err(invalid());
        }

        let minutes = field(3)?;
        let seconds = field(4)?;
        let secs = days
            .checked_mul(86_400)
            .and_then(|d| d.checked_add(hours * 3_600 + minutes * 60 + seconds))
            .ok_or_else(invalid)?;
        Ok(TimeLimit(secs))
    }
}

impl fmt::Display for TimeLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let days = self.0 / 86_400;
        let hours = (self.0 % 86_400) / 3_600;
        let minutes = (self.0 % 3_600) / 60;
        let seconds = self.0 % 60;

        if days > 0 {
            write!(f, "{}.{:02}:{:02}:{:02}", days, hours, minutes, seconds)
        } else {
            write!(f, "{:02}:{:02}:{:02}", hours, minutes, seconds)
        }
    }
}

impl Serialize for TimeLimit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeLimit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
