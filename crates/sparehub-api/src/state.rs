//! Shared application state handed to every handler.

use sparehub_core::Config;
use sparehub_db::ProductStore;
use sparehub_processing::{IngestionPipeline, TemplateGenerator};
use std::sync::Arc;

pub struct AppState {
    pub store: Arc<dyn ProductStore>,
    pub pipeline: Arc<IngestionPipeline>,
    pub templates: TemplateGenerator,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ProductStore>) -> Self {
        let pipeline = Arc::new(IngestionPipeline::new(store.clone(), config.ingestion()));
        let templates = TemplateGenerator::new(config.template_dir());
        Self {
            store,
            pipeline,
            templates,
            config,
        }
    }
}
