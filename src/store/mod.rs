//! Document store collaborator
//!
//! The importer only talks to the destination through [`DocumentStore`].
//! [`FileStore`] writes into a vault directory on disk, [`MemoryStore`] keeps
//! everything in memory for hosts that persist notes themselves.

mod document_store;
mod file_store;
mod memory_store;

pub use document_store::{join_path, DocumentStore, Result, StoreError, StoredFile};
pub use file_store::FileStore;
pub use memory_store::MemoryStore;
