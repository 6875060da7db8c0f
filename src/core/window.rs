//! Registration window: from `open_before_minutes` before a session starts
//! until `close_after_minutes` after, and never once the session has ended.

use crate::core::schedule;
use crate::domain::model::Session;
use crate::utils::error::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPolicy {
    pub open_before_minutes: i64,
    pub close_after_minutes: i64,
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self {
            open_before_minutes: 60,
            close_after_minutes: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    TooEarly,
    TooLate,
    SessionEnded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowDenial {
    TooEarly {
        minutes_remaining: i64,
        hours: i64,
        minutes: i64,
    },
    TooLate {
        minutes_late: i64,
    },
    SessionEnded,
}

impl WindowDenial {
    pub fn reason(&self) -> DenialReason {
        match self {
            WindowDenial::TooEarly { .. } => DenialReason::TooEarly,
            WindowDenial::TooLate { .. } => DenialReason::TooLate,
            WindowDenial::SessionEnded => DenialReason::SessionEnded,
        }
    }

    pub fn message(&self, policy: &WindowPolicy) -> String {
        match self {
            WindowDenial::TooEarly { hours, minutes, .. } => {
                let hours_part = if *hours > 0 {
                    format!("{} hour(s) and ", hours)
                } else {
                    String::new()
                };
                format!(
                    "The session starts in {}{} minute(s). Registration opens {} minutes before the start.",
                    hours_part, minutes, policy.open_before_minutes
                )
            }
            WindowDenial::TooLate { minutes_late } => format!(
                "It is too late to register. The session started {} minute(s) ago. Registration closes {} minutes after the start.",
                minutes_late, policy.close_after_minutes
            ),
            WindowDenial::SessionEnded => "The session has already ended".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowDecision {
    Allowed,
    Denied(WindowDenial),
}

impl WindowDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, WindowDecision::Allowed)
    }
}

/// Whole minutes from `now` until `start`, rounded towards negative infinity.
pub fn minutes_until(start: NaiveDateTime, now: NaiveDateTime) -> i64 {
    let diff_ms = (start - now).num_milliseconds();
    diff_ms.div_euclid(60_000)
}

/// Decides whether registering for `session` is allowed at `now`.
///
/// Boundaries are inclusive on the allowed side: exactly `open_before_minutes`
/// before the start and exactly `close_after_minutes` after it both pass.
/// The session end is only parsed when it matters, so a session with a bad
/// end time can still be checked while its window is open.
pub fn evaluate_window(
    session: &Session,
    now: NaiveDateTime,
    year: i32,
    policy: &WindowPolicy,
) -> Result<WindowDecision> {
    let start = schedule::session_start(session, year)?;
    let diff_minutes = minutes_until(start, now);

    if diff_minutes < 0 {
        let minutes_since_start = -diff_minutes;
        if minutes_since_start <= policy.close_after_minutes {
            return Ok(WindowDecision::Allowed);
        }

        let end = schedule::session_end(session, year)?;
        if now > end {
            return Ok(WindowDecision::Denied(WindowDenial::SessionEnded));
        }
        return Ok(WindowDecision::Denied(WindowDenial::TooLate {
            minutes_late: minutes_since_start,
        }));
    }

    if diff_minutes > policy.open_before_minutes {
        return Ok(WindowDecision::Denied(WindowDenial::TooEarly {
            minutes_remaining: diff_minutes,
            hours: diff_minutes / 60,
            minutes: diff_minutes % 60,
        }));
    }

    Ok(WindowDecision::Allowed)
}
