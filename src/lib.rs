#![doc(test(attr(deny(warnings))))]

//! Trip ledger keeps a small travel expense log: a validated record
//! collection mirrored to local or hosted storage, daily summaries grouped
//! by category, a JPY→TWD converter and a scripted shell on top.

pub mod cli;
pub mod config;
pub mod currency;
pub mod errors;
pub mod ledger;
pub mod report;
pub mod storage;
pub mod time;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("trip ledger tracing initialized");
    });
}
