//! opseed-store: datastore client layer
//!
//! Snapshot parsing into [`DataTree`]s and the [`Datastore`]/[`Session`]
//! traits the loader and the benchmarks drive, with two backends:
//!
//! - [`FileStore`]: directory-backed, shared between processes. Each
//!   operational session keeps its contribution in its own file, removed
//!   when the session stops.
//! - [`MemoryStore`]: in-process, records every call and can inject faults.

pub mod error;
pub mod file;
pub mod memory;
pub mod parser;
pub mod session;
pub mod tree;

pub use error::{ParseError, StoreError};
pub use file::{FileSession, FileStore};
pub use memory::{Fault, MemorySession, MemoryStore, StoreEvent};
pub use parser::{parse_snapshot, parse_snapshot_file};
pub use session::{Datastore, DatastoreKind, Session};
pub use tree::DataTree;
