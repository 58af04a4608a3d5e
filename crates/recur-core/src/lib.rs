//! recur-core
//!
//! Scheduling and execution services for recurring ledger templates.
//! Depends on recur-domain. Storage is reached only through the collaborator traits in
//! [`storage`]; no CLI, no terminal I/O.

pub mod error;
pub mod execution_service;
pub mod memory_store;
pub mod storage;
pub mod sweep_service;
pub mod template_service;
pub mod time;

pub use error::{CoreError, EntityKind, ErrorKind};
pub use execution_service::*;
pub use memory_store::InMemoryLedgerStore;
pub use storage::*;
pub use sweep_service::*;
pub use template_service::*;
pub use time::{Clock, FixedClock, SystemClock};
