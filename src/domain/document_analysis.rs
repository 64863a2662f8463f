use crate::domain::Page;

/// Flattened output of the document layout service: the whole document
/// rendered as markdown plus per-page structure.
///
/// This shape is owned by the application, not by the upstream client
/// library; the adapter maps the service response into it once.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentAnalysis {
    pub content_markdown: String,
    pub pages: Vec<Page>,
}
