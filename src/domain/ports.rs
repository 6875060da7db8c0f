use crate::domain::model::{GeneralAttendanceRecord, Row, SessionAttendanceRecord, SheetKind};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::time::Duration;

/// The event workbook: read a whole sheet, append one row.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn attendee_exists(&self, dni: &str) -> Result<bool>;
    async fn read_records(&self, kind: SheetKind) -> Result<Vec<Row>>;
    async fn append_session_attendance(&self, record: &SessionAttendanceRecord) -> Result<()>;
    async fn append_general_attendance(&self, record: &GeneralAttendanceRecord) -> Result<()>;
}

pub trait RegistrationLock: Send + Sync {
    /// Waits at most `timeout`; giving up is `CheckinError::LockTimeout`.
    fn acquire(
        &self,
        timeout: Duration,
    ) -> impl std::future::Future<Output = Result<LockGuard>> + Send;
}

/// Held lock. Dropping it releases, whichever way the holder exits.
pub struct LockGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl LockGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockGuard")
            .field("held", &self.release.is_some())
            .finish()
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

pub trait ConfigProvider: Send + Sync {
    fn data_dir(&self) -> &str;
    fn event_year(&self) -> i32;
    fn lock_timeout(&self) -> Duration;
    fn open_before_minutes(&self) -> i64;
    fn close_after_minutes(&self) -> i64;
}
