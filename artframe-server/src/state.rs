use std::time::Instant;

use artframe_core::AssetService;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: AssetService,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: AssetService) -> Self {
        Self {
            service,
            started_at: Instant::now(),
        }
    }
}
