#![doc(test(attr(deny(warnings))))]

//! Budget Buddy pairs the buddy-core expense engine with JSON storage and an
//! interactive shell for recording expenses and reading spending analytics.

pub mod cli;
pub mod errors;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Budget Buddy tracing initialized.");
    });
}
