//! Gantt chart configuration loaded from `config.json`.
//!
//! ```json
//! {
//!     "font_name": "Meiryo UI",
//!     "tab_title": "Schedule",
//!     "start_date": "2025/04/01",
//!     "end_date": "2025/06/30",
//!     "holidays": ["2025/04/29", "2025/05/05"]
//! }
//! ```
//!
//! Every key is required. Dates use the `YYYY/MM/DD` form.

use crate::calendar::WorkCalendar;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = "config.json";

/// Date format used in the configuration file
pub const CONFIG_DATE_FORMAT: &str = "%Y/%m/%d";

/// Longest worksheet name Excel accepts
const MAX_TAB_TITLE_LEN: usize = 31;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file '{}' not found", .0.display())]
    NotFound(PathBuf),

    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("format error in config: {0}")]
    Format(#[from] serde_json::Error),

    #[error("format error in config: '{field}' has invalid date '{value}' (expected YYYY/MM/DD)")]
    InvalidDate { field: String, value: String },

    #[error("format error in config: end_date {end} is before start_date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("format error in config: invalid tab_title '{title}': {reason}")]
    InvalidTabTitle { title: String, reason: &'static str },
}

/// Raw shape of the JSON file
#[derive(Debug, Deserialize)]
struct RawConfig {
    font_name: String,
    tab_title: String,
    start_date: String,
    end_date: String,
    holidays: Vec<String>,
    #[serde(flatten)]
    unknown: BTreeMap<String, serde_json::Value>,
}

/// Validated Gantt chart settings
#[derive(Clone, Debug, PartialEq)]
pub struct GanttConfig {
    /// Font applied to every written cell
    pub font_name: String,
    /// Worksheet tab name
    pub tab_title: String,
    /// First calendar column
    pub start_date: NaiveDate,
    /// Last calendar column (inclusive)
    pub end_date: NaiveDate,
    /// Extra non-working days on top of weekends
    pub holidays: Vec<NaiveDate>,
}

impl GanttConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_json_str(&text)
    }

    /// Parse and validate configuration text
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(text)?;

        for key in raw.unknown.keys() {
            warn!(key = %key, "ignoring unknown config key");
        }

        let start_date = parse_date("start_date", &raw.start_date)?;
        let end_date = parse_date("end_date", &raw.end_date)?;
        if end_date < start_date {
            return Err(ConfigError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }

        let holidays = raw
            .holidays
            .iter()
            .map(|h| parse_date("holidays", h))
            .collect::<Result<Vec<_>, _>>()?;

        validate_tab_title(&raw.tab_title)?;

        Ok(Self {
            font_name: raw.font_name,
            tab_title: raw.tab_title,
            start_date,
            end_date,
            holidays,
        })
    }

    /// Working-day calendar built from the configured holidays
    pub fn calendar(&self) -> WorkCalendar {
        WorkCalendar::new(self.holidays.iter().copied())
    }

    /// Every date of the chart window, `start_date..=end_date`
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end_date;
        self.start_date.iter_days().take_while(move |d| *d <= end)
    }

    /// Number of calendar columns
    pub fn day_count(&self) -> usize {
        (self.end_date - self.start_date).num_days() as usize + 1
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), CONFIG_DATE_FORMAT).map_err(|_| {
        ConfigError::InvalidDate {
            field: field.to_string(),
            value: value.to_string(),
        }
    })
}

fn validate_tab_title(title: &str) -> Result<(), ConfigError> {
    let reason = if title.is_empty() {
        Some("must not be empty")
    } else if title.chars().count() > MAX_TAB_TITLE_LEN {
        Some("must be at most 31 characters")
    } else if title.contains(['[', ']', ':', '*', '?', '/', '\\']) {
        Some("must not contain any of [ ] : * ? / \\")
    } else if title.starts_with('\'') || title.ends_with('\'') {
        Some("must not start or end with an apostrophe")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConfigError::InvalidTabTitle {
            title: title.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
