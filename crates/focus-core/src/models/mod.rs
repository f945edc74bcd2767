//! Data models for Focus

mod interrupt;
mod session;
mod sync_status;

pub use interrupt::{Interrupt, InterruptOutcome, DEFAULT_TRIGGER};
pub use session::{Session, SessionStatus, DEFAULT_PLANNED_MINUTES};
pub use sync_status::SyncStatus;

/// A locally-created record that can be merged by its client id.
pub trait Record {
    /// The merge key, unique within one local collection.
    fn record_id(&self) -> &str;
}

impl Record for Session {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for Interrupt {
    fn record_id(&self) -> &str {
        &self.id
    }
}
