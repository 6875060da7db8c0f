pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{CsvSheetStore, FixedClock, MemoryStore, ProcessLock, SystemClock};
pub use config::toml_config::TomlConfig;
pub use core::attendance::{AttendeeSummary, GeneralOutcome, SessionCapacity};
pub use core::registration::{Registrar, RegistrarSettings, RegistrationOutcome};
pub use core::window::{evaluate_window, DenialReason, WindowDecision, WindowDenial, WindowPolicy};
pub use utils::error::{CheckinError, Result};
