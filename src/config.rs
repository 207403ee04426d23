use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use std::{env, path::PathBuf};

const DEFAULT_DATA_PATH: &str = "data/tracker.json";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    pub port: u16,
    /// Offset that decides the calendar day. Local time when unset.
    pub utc_offset: Option<FixedOffset>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let utc_offset = match env::var("APP_UTC_OFFSET") {
            Ok(value) => Some(parse_utc_offset(&value)?),
            Err(_) => None,
        };

        Ok(Self {
            data_path: resolve_data_path(),
            port: env::var("PORT")
                .ok()
                .and_then(|value| value.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT),
            utc_offset,
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    pub fn today(&self) -> NaiveDate {
        self.date_of(self.now())
    }

    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self.utc_offset {
            Some(offset) => instant.with_timezone(&offset).date_naive(),
            None => instant.with_timezone(&Local).date_naive(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            port: DEFAULT_PORT,
            utc_offset: None,
        }
    }
}

pub fn resolve_data_path() -> PathBuf {
    env::var("APP_DATA_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_PATH))
}

/// Parses `+03:00`, `-0530` or `Z`.
pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, String> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value == "+00:00" {
        return FixedOffset::east_opt(0).ok_or_else(|| "invalid offset".to_string());
    }

    let (sign, rest) = match value.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(format!("invalid APP_UTC_OFFSET '{value}'")),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("invalid APP_UTC_OFFSET '{value}'"));
    }

    let hours: i32 = digits[..2].parse().map_err(|_| format!("invalid hours in '{value}'"))?;
    let minutes: i32 = digits[2..].parse().map_err(|_| format!("invalid minutes in '{value}'"))?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| format!("APP_UTC_OFFSET '{value}' out of range"))
}
