pub mod document_intelligence;
pub mod llm;
pub mod observability;
