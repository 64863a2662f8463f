pub mod prompts;

mod extraction_service;
mod structure_service;

pub use extraction_service::{
    CategoryExtraction, ExtractionError, ExtractionPage, ExtractionService,
};
pub use structure_service::{DocumentStructure, StructureError, StructureService};
