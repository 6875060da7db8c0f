//! Day and time-of-day parsing for the sessions sheet, and the session
//! time ranges built from them.

use crate::domain::model::{Session, TimeRange};
use crate::utils::error::{CheckinError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayOfYear {
    pub day: u32,
    /// 1-based.
    pub month: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

static NUMERIC_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})(?:[/-]\d{2,4})?$").unwrap());
static ISO_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-(\d{1,2})-(\d{1,2})$").unwrap());
static SPANISH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:[a-záéíóúñ]+,?\s+)?(\d{1,2})\s+de\s+([a-záéíóúñ]+)$").unwrap()
});
static TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{1,2}):(\d{2})(?::\d{2})?\s*(a\.?\s*m\.?|p\.?\s*m\.?)?$").unwrap()
});

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Parses the `Dia` column into a day/month pair. Any year in the token is ignored.
pub fn parse_day(token: &str) -> Result<DayOfYear> {
    let token = token.trim();

    let (day, month) = if let Some(caps) = ISO_DAY.captures(token) {
        (caps[2].parse::<u32>().ok(), caps[1].parse::<u32>().ok())
    } else if let Some(caps) = NUMERIC_DAY.captures(token) {
        (caps[1].parse::<u32>().ok(), caps[2].parse::<u32>().ok())
    } else if let Some(caps) = SPANISH_DAY.captures(token) {
        let name = caps[2].to_lowercase();
        // "setiembre" 也常見
        let month = MONTHS
            .iter()
            .position(|m| *m == name || (name == "setiembre" && *m == "septiembre"))
            .map(|i| i as u32 + 1);
        (caps[1].parse::<u32>().ok(), month)
    } else {
        (None, None)
    };

    match (day, month) {
        (Some(day), Some(month)) if (1..=12).contains(&month) && (1..=31).contains(&day) => {
            Ok(DayOfYear { day, month })
        }
        _ => Err(CheckinError::data(format!("unrecognised session day '{}'", token))),
    }
}

/// Parses `Tiempo Inicio` / `Tiempo Fin`: `H:MM`, `HH:MM[:SS]`, optional am/pm.
pub fn parse_time(token: &str) -> Result<TimeOfDay> {
    let token = token.trim();
    let invalid = || CheckinError::data(format!("unrecognised session time '{}'", token));

    let caps = TIME.captures(token).ok_or_else(invalid)?;
    let mut hour: u32 = caps[1].parse().map_err(|_| invalid())?;
    let minute: u32 = caps[2].parse().map_err(|_| invalid())?;

    if let Some(meridiem) = caps.get(3) {
        if !(1..=12).contains(&hour) {
            return Err(invalid());
        }
        let pm = meridiem.as_str().to_ascii_lowercase().starts_with('p');
        hour = match (pm, hour) {
            (false, 12) => 0,
            (true, 12) => 12,
            (true, h) => h + 12,
            (false, h) => h,
        };
    }

    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok(TimeOfDay { hour, minute })
}

pub fn at(year: i32, day: DayOfYear, time: TimeOfDay) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, day.month, day.day)
        .and_then(|date| date.and_hms_opt(time.hour, time.minute, 0))
        .ok_or_else(|| {
            CheckinError::data(format!(
                "{:02}/{:02}/{} is not a calendar date",
                day.day, day.month, year
            ))
        })
}

pub fn session_start(session: &Session, year: i32) -> Result<NaiveDateTime> {
    at(year, parse_day(&session.day)?, parse_time(&session.start)?)
}

pub fn session_end(session: &Session, year: i32) -> Result<NaiveDateTime> {
    at(year, parse_day(&session.day)?, parse_time(&session.end)?)
}

pub fn session_time_range(session: &Session, year: i32) -> Result<TimeRange> {
    let start = session_start(session, year)?;
    let end = session_end(session, year)?;
    if end <= start {
        return Err(CheckinError::data(format!(
            "session '{}' ends at {} which is not after its start {}",
            session.id, session.end, session.start
        )));
    }
    Ok(TimeRange::new(start, end))
}
