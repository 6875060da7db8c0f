// Adapters layer: concrete implementations of the domain ports.

pub mod clock;
pub mod csv_store;
pub mod lock;
pub mod memory;

pub use clock::{FixedClock, SystemClock};
pub use csv_store::{CsvSheetStore, SheetFiles};
pub use lock::ProcessLock;
pub use memory::MemoryStore;
