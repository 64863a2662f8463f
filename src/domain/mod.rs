mod category;
mod document_analysis;
mod page;

pub use category::Category;
pub use document_analysis::DocumentAnalysis;
pub use page::{BoundingRegion, Figure, Line, Page, Span, Table, TableCell};
