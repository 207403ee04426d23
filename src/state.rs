use crate::config::Config;
use crate::storage::TrackerStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn TrackerStore>,
}

impl AppState {
    pub fn new(config: Config, store: impl TrackerStore + 'static) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
        }
    }
}
