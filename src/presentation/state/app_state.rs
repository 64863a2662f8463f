use std::sync::Arc;

use crate::application::ports::{ChatClient, DocumentAnalyzer};
use crate::application::services::{ExtractionService, StructureService};

pub struct AppState<D, C>
where
    D: DocumentAnalyzer,
    C: ChatClient,
{
    pub structure_service: Arc<StructureService<D, C>>,
    pub extraction_service: Arc<ExtractionService<C>>,
}

impl<D, C> Clone for AppState<D, C>
where
    D: DocumentAnalyzer,
    C: ChatClient,
{
    fn clone(&self) -> Self {
        Self {
            structure_service: Arc::clone(&self.structure_service),
            extraction_service: Arc::clone(&self.extraction_service),
        }
    }
}
