// Sync orchestration: triggers, debounce, progress indicator, status, scheduler.

pub mod progress;
pub mod scheduler;
pub mod status;
pub mod trigger;

pub use scheduler::{CycleOutcome, CycleReport, SkipReason, SyncScheduler, SyncState};
pub use status::{StatusBoard, StatusSnapshot, StatusSurface, SyncStatus};
pub use trigger::Trigger;
