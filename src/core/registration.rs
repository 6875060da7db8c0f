use crate::core::schedule;
use crate::core::window::{evaluate_window, DenialReason, WindowDecision, WindowDenial, WindowPolicy};
use crate::domain::model::{cell, Session, SessionAttendanceRecord, SheetKind, COL_DNI};
use crate::domain::ports::{Clock, ConfigProvider, RecordStore, RegistrationLock};
use crate::utils::error::Result;
use crate::utils::validation::is_valid_dni_length;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrarSettings {
    /// Year every session day is placed in.
    pub year: i32,
    pub lock_timeout: Duration,
    pub policy: WindowPolicy,
}

impl Default for RegistrarSettings {
    fn default() -> Self {
        Self {
            year: 2025,
            lock_timeout: Duration::from_millis(2000),
            policy: WindowPolicy::default(),
        }
    }
}

impl RegistrarSettings {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            year: config.event_year(),
            lock_timeout: config.lock_timeout(),
            policy: WindowPolicy {
                open_before_minutes: config.open_before_minutes(),
                close_after_minutes: config.close_after_minutes(),
            },
        }
    }
}

/// Result of a session registration attempt. Business rule violations are
/// outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationOutcome {
    InvalidDni {
        dni: String,
    },
    MissingSessionId,
    DniNotFound {
        dni: String,
    },
    SessionNotFound {
        session_id: String,
    },
    NoGeneralAttendance {
        dni: String,
    },
    WindowDenied {
        session_id: String,
        session_name: String,
        reason: DenialReason,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minutes_remaining: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hours: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minutes: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minutes_late: Option<i64>,
    },
    NoCapacity {
        session_id: String,
        session_name: String,
        total_capacity: u32,
        registered: usize,
    },
    AlreadyRegistered {
        dni: String,
        session_id: String,
        session_name: String,
    },
    ScheduleConflict {
        session_id: String,
        conflict_session_id: String,
        conflict_name: String,
    },
    Registered {
        dni: String,
        session_id: String,
        session_name: String,
        timestamp: String,
    },
}

impl RegistrationOutcome {
    pub fn is_registered(&self) -> bool {
        matches!(self, RegistrationOutcome::Registered { .. })
    }

    fn window_denied(session: &Session, denial: &WindowDenial, policy: &WindowPolicy) -> Self {
        let (minutes_remaining, hours, minutes, minutes_late) = match denial {
            WindowDenial::TooEarly {
                minutes_remaining,
                hours,
                minutes,
            } => (Some(*minutes_remaining), Some(*hours), Some(*minutes), None),
            WindowDenial::TooLate { minutes_late } => (None, None, None, Some(*minutes_late)),
            WindowDenial::SessionEnded => (None, None, None, None),
        };

        RegistrationOutcome::WindowDenied {
            session_id: session.id.clone(),
            session_name: session.name.clone(),
            reason: denial.reason(),
            message: denial.message(policy),
            minutes_remaining,
            hours,
            minutes,
            minutes_late,
        }
    }

    /// Text shown to the attendee at the kiosk.
    pub fn message(&self) -> String {
        match self {
            RegistrationOutcome::InvalidDni { .. } => "The DNI must have 8 digits".to_string(),
            RegistrationOutcome::MissingSessionId => "A session must be selected".to_string(),
            RegistrationOutcome::DniNotFound { dni } => {
                format!("DNI {} is not on the attendee list", dni)
            }
            RegistrationOutcome::SessionNotFound { session_id } => {
                format!("Session {} does not exist", session_id)
            }
            RegistrationOutcome::NoGeneralAttendance { .. } => {
                "General attendance must be registered first".to_string()
            }
            RegistrationOutcome::WindowDenied { message, .. } => message.clone(),
            RegistrationOutcome::NoCapacity { session_name, .. } => {
                format!("No seats left for {}", session_name)
            }
            RegistrationOutcome::AlreadyRegistered { session_name, .. } => {
                format!("Already registered for {}", session_name)
            }
            RegistrationOutcome::ScheduleConflict { conflict_name, .. } => {
                format!("The schedule overlaps with {}", conflict_name)
            }
            RegistrationOutcome::Registered { session_name, .. } => {
                format!("Successfully registered for {}", session_name)
            }
        }
    }
}

/// Registers attendees into sessions against a shared record store.
///
/// Checks run in a fixed order and stop at the first failure. Capacity,
/// duplicate and schedule overlap are evaluated with the registration lock
/// held, together with the append, so two registrars sharing a lock cannot
/// both pass the checks on the same stale snapshot.
pub struct Registrar<S: RecordStore, L: RegistrationLock, C: Clock> {
    pub(crate) store: S,
    pub(crate) lock: L,
    pub(crate) clock: C,
    pub(crate) settings: RegistrarSettings,
}

impl<S: RecordStore, L: RegistrationLock, C: Clock> Registrar<S, L, C> {
    pub fn new(store: S, lock: L, clock: C, settings: RegistrarSettings) -> Self {
        Self {
            store,
            lock,
            clock,
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub(crate) async fn load_sessions(&self) -> Result<Vec<Session>> {
        let rows = self.store.read_records(SheetKind::Sessions).await?;
        Ok(rows.iter().filter_map(Session::from_row).collect())
    }

    pub(crate) async fn session_attendance(&self) -> Result<Vec<SessionAttendanceRecord>> {
        let rows = self.store.read_records(SheetKind::SessionAttendance).await?;
        Ok(rows.iter().map(SessionAttendanceRecord::from_row).collect())
    }

    pub async fn register(
        &self,
        dni: &str,
        session_id: &str,
        timestamp: &str,
    ) -> Result<RegistrationOutcome> {
        tracing::debug!("Session registration request: dni={} session={}", dni, session_id);

        if !is_valid_dni_length(dni) {
            return Ok(RegistrationOutcome::InvalidDni {
                dni: dni.to_string(),
            });
        }
        // 空白只用於判斷是否缺少，查詢時使用原始值
        if session_id.trim().is_empty() {
            return Ok(RegistrationOutcome::MissingSessionId);
        }
        if !self.store.attendee_exists(dni).await? {
            return Ok(RegistrationOutcome::DniNotFound {
                dni: dni.to_string(),
            });
        }

        let sessions = self.load_sessions().await?;
        let Some(session) = sessions.iter().find(|s| s.id == session_id) else {
            return Ok(RegistrationOutcome::SessionNotFound {
                session_id: session_id.to_string(),
            });
        };

        let general = self.store.read_records(SheetKind::GeneralAttendance).await?;
        if !general.iter().any(|r| cell(r, COL_DNI) == dni) {
            return Ok(RegistrationOutcome::NoGeneralAttendance {
                dni: dni.to_string(),
            });
        }

        let now = self.clock.now();
        let policy = &self.settings.policy;
        if let WindowDecision::Denied(denial) =
            evaluate_window(session, now, self.settings.year, policy)?
        {
            tracing::info!(
                "⏰ Registration window closed for session {} ({:?})",
                session.id,
                denial.reason()
            );
            return Ok(RegistrationOutcome::window_denied(session, &denial, policy));
        }

        let _guard = self.lock.acquire(self.settings.lock_timeout).await?;
        let attendance = self.session_attendance().await?;

        let registered = attendance
            .iter()
            .filter(|r| r.session_id == session.id)
            .count();
        if registered >= session.capacity as usize {
            return Ok(RegistrationOutcome::NoCapacity {
                session_id: session.id.clone(),
                session_name: session.name.clone(),
                total_capacity: session.capacity,
                registered,
            });
        }

        if attendance
            .iter()
            .any(|r| r.attendee_id == dni && r.session_id == session.id)
        {
            return Ok(RegistrationOutcome::AlreadyRegistered {
                dni: dni.to_string(),
                session_id: session.id.clone(),
                session_name: session.name.clone(),
            });
        }

        let target = schedule::session_time_range(session, self.settings.year)?;
        for record in attendance.iter().filter(|r| r.attendee_id == dni) {
            let Some(other) = sessions.iter().find(|s| s.id == record.session_id) else {
                continue;
            };
            let other_range = match schedule::session_time_range(other, self.settings.year) {
                Ok(range) => range,
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Skipping session {} in overlap check for {}: {}",
                        other.id,
                        dni,
                        e
                    );
                    continue;
                }
            };
            if target.overlaps(&other_range) {
                tracing::info!(
                    "Schedule conflict for {}: {} overlaps {}",
                    dni,
                    session.id,
                    other.id
                );
                return Ok(RegistrationOutcome::ScheduleConflict {
                    session_id: session.id.clone(),
                    conflict_session_id: other.id.clone(),
                    conflict_name: other.name.clone(),
                });
            }
        }

        let record = SessionAttendanceRecord {
            attendee_id: dni.to_string(),
            session_id: session.id.clone(),
            timestamp: timestamp.to_string(),
        };
        self.store.append_session_attendance(&record).await?;

        tracing::info!("✅ {} registered for session {}", dni, session.id);
        Ok(RegistrationOutcome::Registered {
            dni: record.attendee_id,
            session_id: record.session_id,
            session_name: session.name.clone(),
            timestamp: record.timestamp,
        })
    }
}
