pub mod session;
pub mod status;
pub mod store;

pub use session::{SessionManager, SessionRejection};
pub use store::{FileRecordStore, MemoryRecordStore, RecordStore};
