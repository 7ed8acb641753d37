//! List state, views, and persistence for jot, independent of any host.
//!
//! Hosts own a [`ListController`] over some [`KeyValueStore`], call one method
//! per user action, and draw whatever [`ListController::render`] returns.

pub mod controller;
pub mod item;
pub mod removal;
pub mod rows;
pub mod storage;
pub mod view;

pub use controller::{EditRequest, EditResponse, ListController, ListStats};
pub use item::Item;
pub use rows::{RowAction, RowDescriptor};
pub use storage::{DEFAULT_STORAGE_KEY, KeyValueStore, MemoryStore};
pub use view::{FilterMode, SortMode, ViewOptions};
