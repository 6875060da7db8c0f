use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A sheet row: column header to cell text.
pub type Row = HashMap<String, String>;

pub const COL_SESSION_ID: &str = "ID";
pub const COL_SESSION_NAME: &str = "Tipo";
pub const COL_SESSION_DAY: &str = "Dia";
pub const COL_SESSION_START: &str = "Tiempo Inicio";
pub const COL_SESSION_END: &str = "Tiempo Fin";
pub const COL_SESSION_CAPACITY: &str = "Cupos totales";

pub const COL_DNI: &str = "Doc. Identidad";
pub const COL_NAME: &str = "Nombre";
pub const COL_ATTN_SESSION_ID: &str = "Sesion ID";
pub const COL_TIMESTAMP: &str = "Timestamp";
pub const COL_KIT: &str = "Kit";

pub const SESSIONS_HEADER: &[&str] = &[
    COL_SESSION_ID,
    COL_SESSION_NAME,
    COL_SESSION_DAY,
    COL_SESSION_START,
    COL_SESSION_END,
    COL_SESSION_CAPACITY,
];
pub const ATTENDEES_HEADER: &[&str] = &[COL_DNI, COL_NAME];
pub const GENERAL_HEADER: &[&str] = &[COL_DNI, COL_TIMESTAMP, COL_KIT];
pub const SESSION_ATTN_HEADER: &[&str] = &[COL_DNI, COL_ATTN_SESSION_ID, COL_TIMESTAMP];

/// The four sheets of the event workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetKind {
    Attendees,
    Sessions,
    GeneralAttendance,
    SessionAttendance,
}

impl SheetKind {
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            SheetKind::Attendees => ATTENDEES_HEADER,
            SheetKind::Sessions => SESSIONS_HEADER,
            SheetKind::GeneralAttendance => GENERAL_HEADER,
            SheetKind::SessionAttendance => SESSION_ATTN_HEADER,
        }
    }
}

/// Reads a cell as trimmed text; absent columns read as empty.
pub fn cell<'a>(row: &'a Row, column: &str) -> &'a str {
    row.get(column).map(|v| v.trim()).unwrap_or("")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub day: String,
    pub start: String,
    pub end: String,
    pub capacity: u32,
}

impl Session {
    /// Returns `None` for rows without an `ID`, which the sheet uses as spacers.
    pub fn from_row(row: &Row) -> Option<Self> {
        let id = cell(row, COL_SESSION_ID);
        if id.is_empty() {
            return None;
        }

        Some(Self {
            id: id.to_string(),
            name: cell(row, COL_SESSION_NAME).to_string(),
            day: cell(row, COL_SESSION_DAY).to_string(),
            start: cell(row, COL_SESSION_START).to_string(),
            end: cell(row, COL_SESSION_END).to_string(),
            capacity: parse_capacity(cell(row, COL_SESSION_CAPACITY)),
        })
    }

    pub fn to_row(&self) -> Row {
        Row::from([
            (COL_SESSION_ID.to_string(), self.id.clone()),
            (COL_SESSION_NAME.to_string(), self.name.clone()),
            (COL_SESSION_DAY.to_string(), self.day.clone()),
            (COL_SESSION_START.to_string(), self.start.clone()),
            (COL_SESSION_END.to_string(), self.end.clone()),
            (COL_SESSION_CAPACITY.to_string(), self.capacity.to_string()),
        ])
    }
}

// 空白或非數字的容量視為 0，與試算表的轉換一致
fn parse_capacity(raw: &str) -> u32 {
    if let Ok(n) = raw.parse::<u32>() {
        return n;
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f > 0.0 => f.floor().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub dni: String,
    pub name: String,
}

impl Attendee {
    pub fn from_row(row: &Row) -> Self {
        Self {
            dni: cell(row, COL_DNI).to_string(),
            name: cell(row, COL_NAME).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionAttendanceRecord {
    pub attendee_id: String,
    pub session_id: String,
    pub timestamp: String,
}

impl SessionAttendanceRecord {
    pub fn from_row(row: &Row) -> Self {
        Self {
            attendee_id: cell(row, COL_DNI).to_string(),
            session_id: cell(row, COL_ATTN_SESSION_ID).to_string(),
            timestamp: cell(row, COL_TIMESTAMP).to_string(),
        }
    }

    pub fn to_row(&self) -> Row {
        Row::from([
            (COL_DNI.to_string(), self.attendee_id.clone()),
            (COL_ATTN_SESSION_ID.to_string(), self.session_id.clone()),
            (COL_TIMESTAMP.to_string(), self.timestamp.clone()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralAttendanceRecord {
    pub attendee_id: String,
    pub timestamp: String,
    pub kit_delivered: bool,
}

impl GeneralAttendanceRecord {
    pub fn from_row(row: &Row) -> Self {
        let kit = cell(row, COL_KIT);
        Self {
            attendee_id: cell(row, COL_DNI).to_string(),
            timestamp: cell(row, COL_TIMESTAMP).to_string(),
            kit_delivered: matches!(kit.to_lowercase().as_str(), "si" | "sí" | "true" | "1" | "x"),
        }
    }

    pub fn to_row(&self) -> Row {
        let kit = if self.kit_delivered { "SI" } else { "NO" };
        Row::from([
            (COL_DNI.to_string(), self.attendee_id.clone()),
            (COL_TIMESTAMP.to_string(), self.timestamp.clone()),
            (COL_KIT.to_string(), kit.to_string()),
        ])
    }
}

/// Half-open `[start, end)` interval of naive local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}
