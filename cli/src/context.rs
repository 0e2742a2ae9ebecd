use std::sync::Arc;

use critbot_core::AppConfigExt;
use critbot_core::session::ControlFlags;
use critbot_core::types::AppConfig;
use tokio::sync::RwLock;

/// Holds all shared state for the CLI application.
/// This is a lightweight container - logic lives in the command handlers.
#[derive(Clone)]
pub struct CliContext {
    pub config: Arc<RwLock<AppConfig>>,
    /// Pause/stop switches shared with whatever session is running.
    pub flags: Arc<ControlFlags>,
}

impl CliContext {
    pub fn new() -> Self {
        let config = match AppConfig::load() {
            Ok(config) => config,
            Err(error) => {
                tracing::warn!(%error, "config load failed, starting from defaults");
                AppConfig::default()
            }
        };
        Self {
            config: Arc::new(RwLock::new(config)),
            flags: Arc::new(ControlFlags::default()),
        }
    }
}

impl Default for CliContext {
    fn default() -> Self {
        Self::new()
    }
}
