//! Tracing initialization for embedding applications and tests.
//!
//! The pipeline emits `tracing` spans; the database and worker pool use
//! `log` macros. `init` installs a subscriber for the former and the
//! `tracing-log` bridge for the latter.

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Installs the global tracing subscriber. Filter comes from `RUST_LOG`,
/// defaulting to `info`. Safe to call more than once.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        // Route log:: records through tracing. Ignore the error if a
        // logger was already installed by the host application.
        let _ = tracing_log::LogTracer::init();

        let subscriber = fmt()
            .with_env_filter(filter)
            .with_target(true)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
