#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use session_checkin::core::RegistrationLock;
use session_checkin::domain::model::{Row, Session, SheetKind, COL_DNI, COL_NAME, COL_TIMESTAMP};
use session_checkin::domain::ports::LockGuard;
use session_checkin::{
    CheckinError, FixedClock, MemoryStore, ProcessLock, Registrar, RegistrarSettings, Result,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DNI: &str = "12345678";
pub const OTHER_DNI: &str = "87654321";

/// 2025-11-20 09:30, half an hour before the 10:00 sessions.
pub fn now() -> NaiveDateTime {
    at(9, 30)
}

pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 11, 20)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

pub fn session(id: &str, name: &str, start: &str, end: &str, capacity: u32) -> Session {
    Session {
        id: id.to_string(),
        name: name.to_string(),
        day: "20/11".to_string(),
        start: start.to_string(),
        end: end.to_string(),
        capacity,
    }
}

pub async fn add_attendee(store: &MemoryStore, dni: &str, name: &str) {
    store
        .insert_row(
            SheetKind::Attendees,
            Row::from([
                (COL_DNI.to_string(), dni.to_string()),
                (COL_NAME.to_string(), name.to_string()),
            ]),
        )
        .await;
}

pub async fn add_general(store: &MemoryStore, dni: &str, timestamp: &str) {
    store
        .insert_row(
            SheetKind::GeneralAttendance,
            Row::from([
                (COL_DNI.to_string(), dni.to_string()),
                (COL_TIMESTAMP.to_string(), timestamp.to_string()),
            ]),
        )
        .await;
}

pub async fn add_session(store: &MemoryStore, session: Session) {
    store.insert_row(SheetKind::Sessions, session.to_row()).await;
}

/// Attendee `DNI` exists, has general attendance, and session S1
/// (10:00-11:00, capacity 2) is on the schedule.
pub async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    add_attendee(&store, DNI, "Ana Quispe").await;
    add_general(&store, DNI, "2025-11-20T08:05:00").await;
    add_session(&store, session("S1", "Keynote", "10:00", "11:00", 2)).await;
    store
}

pub fn registrar_at<L: RegistrationLock>(
    store: MemoryStore,
    lock: L,
    now: NaiveDateTime,
) -> Registrar<MemoryStore, L, FixedClock> {
    Registrar::new(store, lock, FixedClock(now), RegistrarSettings::default())
}

pub fn registrar(store: MemoryStore) -> Registrar<MemoryStore, ProcessLock, FixedClock> {
    registrar_at(store, ProcessLock::new(), now())
}

/// Lock that records acquisitions and releases, or always times out.
#[derive(Debug, Clone, Default)]
pub struct CountingLock {
    pub acquired: Arc<AtomicUsize>,
    pub released: Arc<AtomicUsize>,
    pub always_time_out: bool,
}

impl CountingLock {
    pub fn timing_out() -> Self {
        Self {
            always_time_out: true,
            ..Self::default()
        }
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl RegistrationLock for CountingLock {
    async fn acquire(&self, timeout: Duration) -> Result<LockGuard> {
        if self.always_time_out {
            return Err(CheckinError::LockTimeout {
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        let released = self.released.clone();
        Ok(LockGuard::new(move || {
            released.fetch_add(1, Ordering::SeqCst);
        }))
    }
}
