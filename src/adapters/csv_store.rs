use crate::domain::model::{
    cell, GeneralAttendanceRecord, Row, SessionAttendanceRecord, SheetKind, COL_DNI,
};
use crate::domain::ports::RecordStore;
use crate::utils::error::{CheckinError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// File name of each sheet inside the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetFiles {
    pub attendees: String,
    pub sessions: String,
    pub general_attendance: String,
    pub session_attendance: String,
}

impl Default for SheetFiles {
    fn default() -> Self {
        Self {
            attendees: "asistentes.csv".to_string(),
            sessions: "sesiones.csv".to_string(),
            general_attendance: "asistencia_general.csv".to_string(),
            session_attendance: "asistencia_sesiones.csv".to_string(),
        }
    }
}

impl SheetFiles {
    pub fn file_for(&self, kind: SheetKind) -> &str {
        match kind {
            SheetKind::Attendees => &self.attendees,
            SheetKind::Sessions => &self.sessions,
            SheetKind::GeneralAttendance => &self.general_attendance,
            SheetKind::SessionAttendance => &self.session_attendance,
        }
    }
}

/// Workbook kept as one CSV file per sheet. A missing file reads as an empty
/// sheet and is created with its header on first append.
#[derive(Debug, Clone)]
pub struct CsvSheetStore {
    base_path: PathBuf,
    files: SheetFiles,
}

impl CsvSheetStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self::with_files(base_path, SheetFiles::default())
    }

    pub fn with_files(base_path: impl Into<PathBuf>, files: SheetFiles) -> Self {
        Self {
            base_path: base_path.into(),
            files,
        }
    }

    pub fn sheet_path(&self, kind: SheetKind) -> PathBuf {
        self.base_path.join(self.files.file_for(kind))
    }

    async fn append_row(&self, kind: SheetKind, row: Row) -> Result<()> {
        let path = self.sheet_path(kind);
        tracing::debug!("Appending row to {}", path.display());
        tokio::task::spawn_blocking(move || append_row_blocking(&path, kind, &row))
            .await
            .map_err(|e| CheckinError::StoreError {
                message: format!("append task failed: {}", e),
            })?
    }
}

fn read_sheet_blocking(path: &Path) -> Result<Vec<Row>> {
    if !path.exists() {
        tracing::debug!("Sheet {} does not exist yet, reading as empty", path.display());
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    // 欄位不足的列，缺少的儲存格視為空字串
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(i, column)| (column.to_string(), record.get(i).unwrap_or("").to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn existing_header(path: &Path) -> Result<Option<Vec<String>>> {
    if fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true) {
        return Ok(None);
    }
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let header = reader.headers()?.iter().map(str::to_string).collect();
    Ok(Some(header))
}

/// True when the file has content whose last byte is not a line break.
fn missing_trailing_newline(path: &Path) -> Result<bool> {
    let mut file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e.into()),
    };
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

fn append_row_blocking(path: &Path, kind: SheetKind, row: &Row) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let header = existing_header(path)?;
    let needs_newline = missing_trailing_newline(path)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if needs_newline {
        file.write_all(b"\n")?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    // 新檔案先寫表頭；既有檔案依其欄位順序寫入
    let columns = match header {
        Some(columns) => columns,
        None => {
            let columns: Vec<String> = kind.header().iter().map(|c| c.to_string()).collect();
            writer.write_record(&columns)?;
            columns
        }
    };

    writer.write_record(columns.iter().map(|c| cell(row, c)))?;
    writer.flush()?;
    Ok(())
}

#[async_trait]
impl RecordStore for CsvSheetStore {
    async fn attendee_exists(&self, dni: &str) -> Result<bool> {
        let rows = self.read_records(SheetKind::Attendees).await?;
        Ok(rows.iter().any(|r| cell(r, COL_DNI) == dni))
    }

    async fn read_records(&self, kind: SheetKind) -> Result<Vec<Row>> {
        let path = self.sheet_path(kind);
        tokio::task::spawn_blocking(move || read_sheet_blocking(&path))
            .await
            .map_err(|e| CheckinError::StoreError {
                message: format!("read task failed: {}", e),
            })?
    }

    async fn append_session_attendance(&self, record: &SessionAttendanceRecord) -> Result<()> {
        self.append_row(SheetKind::SessionAttendance, record.to_row())
            .await
    }

    async fn append_general_attendance(&self, record: &GeneralAttendanceRecord) -> Result<()> {
        self.append_row(SheetKind::GeneralAttendance, record.to_row())
            .await
    }
}
