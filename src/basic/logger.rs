use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::basic::result::ConfResult;

static INITIALIZED: AtomicBool = AtomicBool::new(false);

pub struct ConfLogger;

impl ConfLogger {
    /// Install a fmt subscriber filtered by `RUST_LOG` (default `info`).
    ///
    /// Only the first call has an effect. A subscriber installed elsewhere in the
    /// process is left untouched.
    pub fn init() -> ConfResult<()> {
        if INITIALIZED.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        if let Err(error) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
            debug!("[ConfSource.Logger] Keep the subscriber already installed: {}", error);
        }
        Ok(())
    }
}
