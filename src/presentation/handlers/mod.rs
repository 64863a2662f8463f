mod analyze_structure;
mod capabilities;
mod error;
mod extract_category;
mod health;

pub use analyze_structure::{
    analyze_document_structure_handler, AnalyzeDocumentRequest, DocumentStructureResponse,
};
pub use capabilities::capabilities_handler;
pub use error::{ErrorCode, ErrorResponse};
pub use extract_category::{
    extraction_category_handler, ExtractionPageResponse, ExtractionRequest, ExtractionResponse,
};
pub use health::health_handler;
