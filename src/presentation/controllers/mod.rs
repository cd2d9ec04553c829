//! HTTP controllers for handling requests

use std::sync::Arc;

use crate::application::IngestionService;
use crate::infrastructure::ScanRecordRepository;

pub mod health;
pub mod scan;

pub use health::*;
pub use scan::*;

/// Application state containing services
#[derive(Clone)]
pub struct AppState {
    pub ingestion_service: Arc<dyn IngestionService>,
    pub scan_repository: Arc<dyn ScanRecordRepository>,
}
