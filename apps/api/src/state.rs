use std::sync::Arc;

use crate::config::Config;
use crate::interview::SessionController;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The single active interview. Owns the snapshot and archive persistence.
    pub controller: Arc<SessionController>,
    pub config: Config,
}
