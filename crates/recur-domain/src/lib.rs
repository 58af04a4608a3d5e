//! recur-domain
//!
//! Pure domain models for recurring ledger activity (templates, transactions, accounts,
//! categories) plus the calendar arithmetic that schedules them.
//! No I/O, no storage, no logging.

pub mod account;
pub mod category;
pub mod common;
pub mod error;
pub mod recurrence;
pub mod template;
pub mod transaction;

pub use account::*;
pub use category::*;
pub use common::*;
pub use error::DomainError;
pub use recurrence::*;
pub use template::*;
pub use transaction::*;
