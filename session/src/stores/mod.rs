//! Session store implementations.
//!
//! [`PersistentSessionStore`] implements the session rules over any
//! [`SessionStorage`](crate::SessionStorage) backend:
//!
//! - [`MemoryStorage`]: process-local map, for tests and single-run hosts
//! - [`FileStorage`]: one JSON file per key, survives restarts

pub mod file;
pub mod memory;
pub mod persistent;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use persistent::{PersistentSessionStore, SessionPolicy};
