pub mod attendance;
pub mod registration;
pub mod schedule;
pub mod window;

pub use crate::domain::model::{Row, Session, SessionAttendanceRecord, SheetKind, TimeRange};
pub use crate::domain::ports::{Clock, ConfigProvider, RecordStore, RegistrationLock};
pub use crate::utils::error::Result;
