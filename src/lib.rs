#![doc(test(attr(deny(warnings))))]

//! Recurring Core schedules recurring income and expense templates, executes them against
//! account balances and sweeps every owner's due templates in one batch.

pub mod app;
pub mod cli;
pub mod errors;
pub mod utils;

pub use app::RecurringApp;
pub use errors::AppError;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    init_with_filter(None);
}

/// Like [`init`], using `fallback` as the filter when `RUST_LOG` is unset.
pub fn init_with_filter(fallback: Option<&str>) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(fallback);
        tracing::info!("Recurring Core tracing initialized.");
    });
}
