use crate::domain::model::{
    cell, GeneralAttendanceRecord, Row, SessionAttendanceRecord, SheetKind, COL_DNI,
};
use crate::domain::ports::RecordStore;
use crate::utils::error::{CheckinError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Workbook held in memory. Clones share the same sheets.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sheets: Arc<Mutex<HashMap<SheetKind, Vec<Row>>>>,
    fail_appends: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_row(&self, kind: SheetKind, row: Row) {
        let mut sheets = self.sheets.lock().await;
        sheets.entry(kind).or_default().push(row);
    }

    pub async fn rows(&self, kind: SheetKind) -> Vec<Row> {
        let sheets = self.sheets.lock().await;
        sheets.get(&kind).cloned().unwrap_or_default()
    }

    /// Makes every later append fail with `StoreError`.
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    async fn append(&self, kind: SheetKind, row: Row) -> Result<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(CheckinError::StoreError {
                message: format!("{:?} sheet is read-only", kind),
            });
        }
        self.insert_row(kind, row).await;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn attendee_exists(&self, dni: &str) -> Result<bool> {
        let sheets = self.sheets.lock().await;
        Ok(sheets
            .get(&SheetKind::Attendees)
            .map(|rows| rows.iter().any(|r| cell(r, COL_DNI) == dni))
            .unwrap_or(false))
    }

    async fn read_records(&self, kind: SheetKind) -> Result<Vec<Row>> {
        Ok(self.rows(kind).await)
    }

    async fn append_session_attendance(&self, record: &SessionAttendanceRecord) -> Result<()> {
        self.append(SheetKind::SessionAttendance, record.to_row()).await
    }

    async fn append_general_attendance(&self, record: &GeneralAttendanceRecord) -> Result<()> {
        self.append(SheetKind::GeneralAttendance, record.to_row()).await
    }
}
