//! Time-driven pieces of the canvas: debounced history, auto-save and the
//! persistence backends they write through.

mod autosave;
mod debounce;
mod error;
mod history;
mod store;

pub use autosave::{AutoSaveConfig, AutoSaveService, PendingSave, SaveState, SaveStatus};
pub use debounce::Debouncer;
pub use error::PersistenceError;
pub use history::{HistoryConfig, HistoryManager, HistoryMode};
pub use store::{DataModelStore, FileFormat, FileStore, HttpStore, MemoryStore};
