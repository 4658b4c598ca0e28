// Application state module
// Read-only state shared by every request task

use std::sync::Arc;

use super::types::Config;
use crate::media::MediaClass;
use crate::storage::MediaStore;

/// Application state, fixed at startup
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn MediaStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn MediaStore>) -> Self {
        Self { config, store }
    }

    /// Bucket holding objects of the given class
    pub fn bucket_for(&self, class: MediaClass) -> &str {
        class.bucket(&self.config.storage)
    }
}
