//! General check-in and the read-side reports of the workbook.

use crate::core::registration::Registrar;
use crate::domain::model::{
    Attendee, GeneralAttendanceRecord, Session, SheetKind,
};
use crate::domain::ports::{Clock, RecordStore, RegistrationLock};
use crate::utils::error::Result;
use crate::utils::validation::is_valid_dni_length;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GeneralOutcome {
    InvalidDni {
        dni: String,
    },
    DniNotFound {
        dni: String,
    },
    AlreadyRegisteredToday {
        dni: String,
        date: NaiveDate,
    },
    Registered {
        dni: String,
        timestamp: String,
        /// Only the first general check-in of an attendee hands out the kit.
        kit_delivered: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCapacity {
    pub session_id: String,
    pub name: String,
    pub total: u32,
    pub registered: usize,
    pub available: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeSummary {
    pub dni: String,
    pub name: String,
    pub general_attendance: bool,
    pub general_days: usize,
    pub kit_delivered: bool,
    pub sessions: Vec<String>,
}

/// Calendar date of an ISO-8601 timestamp, with or without an offset.
pub fn timestamp_date(timestamp: &str) -> Option<NaiveDate> {
    let timestamp = timestamp.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.naive_local().date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    timestamp
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

impl<S: RecordStore, L: RegistrationLock, C: Clock> Registrar<S, L, C> {
    async fn general_attendance(&self) -> Result<Vec<GeneralAttendanceRecord>> {
        let rows = self.store.read_records(SheetKind::GeneralAttendance).await?;
        Ok(rows.iter().map(GeneralAttendanceRecord::from_row).collect())
    }

    async fn attendees(&self) -> Result<Vec<Attendee>> {
        let rows = self.store.read_records(SheetKind::Attendees).await?;
        Ok(rows
            .iter()
            .map(Attendee::from_row)
            .filter(|a| !a.dni.is_empty())
            .collect())
    }

    /// Checks an attendee in to the event for the day of `timestamp`.
    pub async fn register_general(&self, dni: &str, timestamp: &str) -> Result<GeneralOutcome> {
        if !is_valid_dni_length(dni) {
            return Ok(GeneralOutcome::InvalidDni {
                dni: dni.to_string(),
            });
        }
        if !self.store.attendee_exists(dni).await? {
            return Ok(GeneralOutcome::DniNotFound {
                dni: dni.to_string(),
            });
        }

        let date = timestamp_date(timestamp).unwrap_or_else(|| {
            tracing::warn!("Unparseable timestamp '{}', using the clock's date", timestamp);
            self.clock.now().date()
        });

        let _guard = self.lock.acquire(self.settings.lock_timeout).await?;
        let previous: Vec<GeneralAttendanceRecord> = self
            .general_attendance()
            .await?
            .into_iter()
            .filter(|r| r.attendee_id == dni)
            .collect();

        if previous
            .iter()
            .any(|r| timestamp_date(&r.timestamp) == Some(date))
        {
            return Ok(GeneralOutcome::AlreadyRegisteredToday {
                dni: dni.to_string(),
                date,
            });
        }

        let record = GeneralAttendanceRecord {
            attendee_id: dni.to_string(),
            timestamp: timestamp.to_string(),
            kit_delivered: previous.is_empty(),
        };
        self.store.append_general_attendance(&record).await?;

        tracing::info!(
            "✅ General attendance for {} on {} (kit: {})",
            dni,
            date,
            record.kit_delivered
        );
        Ok(GeneralOutcome::Registered {
            dni: record.attendee_id,
            timestamp: record.timestamp,
            kit_delivered: record.kit_delivered,
        })
    }

    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.load_sessions().await
    }

    pub async fn session_capacity(&self) -> Result<Vec<SessionCapacity>> {
        let sessions = self.load_sessions().await?;
        let attendance = self.session_attendance().await?;

        Ok(sessions
            .into_iter()
            .map(|s| {
                let registered = attendance.iter().filter(|r| r.session_id == s.id).count();
                let available = s
                    .capacity
                    .saturating_sub(u32::try_from(registered).unwrap_or(u32::MAX));
                SessionCapacity {
                    session_id: s.id,
                    name: s.name,
                    total: s.capacity,
                    registered,
                    available,
                }
            })
            .collect())
    }

    pub async fn attendee_summary(&self, dni: &str) -> Result<Option<AttendeeSummary>> {
        let Some(attendee) = self.attendees().await?.into_iter().find(|a| a.dni == dni) else {
            return Ok(None);
        };

        let general: Vec<GeneralAttendanceRecord> = self
            .general_attendance()
            .await?
            .into_iter()
            .filter(|r| r.attendee_id == dni)
            .collect();
        let sessions = self
            .session_attendance()
            .await?
            .into_iter()
            .filter(|r| r.attendee_id == dni)
            .map(|r| r.session_id)
            .collect();

        Ok(Some(summarize(attendee, &general, sessions)))
    }

    /// Every attendee with their attendance, as CSV.
    pub async fn export_attendees(&self) -> Result<String> {
        let attendees = self.attendees().await?;
        let general = self.general_attendance().await?;
        let attendance = self.session_attendance().await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "dni",
            "name",
            "general_attendance",
            "general_days",
            "kit_delivered",
            "sessions",
        ])?;

        for attendee in attendees {
            let own_general: Vec<GeneralAttendanceRecord> = general
                .iter()
                .filter(|r| r.attendee_id == attendee.dni)
                .cloned()
                .collect();
            let sessions = attendance
                .iter()
                .filter(|r| r.attendee_id == attendee.dni)
                .map(|r| r.session_id.clone())
                .collect();
            let summary = summarize(attendee, &own_general, sessions);

            writer.write_record([
                summary.dni.as_str(),
                summary.name.as_str(),
                if summary.general_attendance { "true" } else { "false" },
                summary.general_days.to_string().as_str(),
                if summary.kit_delivered { "true" } else { "false" },
                summary.sessions.join(";").as_str(),
            ])?;
        }

        let data = writer.into_inner().map_err(|e| e.into_error())?;
        tracing::info!("Exported {} bytes of attendee data", data.len());
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}

fn summarize(
    attendee: Attendee,
    general: &[GeneralAttendanceRecord],
    sessions: Vec<String>,
) -> AttendeeSummary {
    let days: HashSet<NaiveDate> = general
        .iter()
        .filter_map(|r| timestamp_date(&r.timestamp))
        .collect();

    AttendeeSummary {
        dni: attendee.dni,
        name: attendee.name,
        general_attendance: !general.is_empty(),
        general_days: days.len(),
        kit_delivered: general.iter().any(|r| r.kit_delivered),
        sessions,
    }
}
