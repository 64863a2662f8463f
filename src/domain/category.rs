use serde::{Deserialize, Serialize};

/// A named grouping of document pages, produced by the classification step.
///
/// Page numbers are 1-based and may overlap between categories; the
/// classifier is free to assign the same page to several groupings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category: String,
    pub page_numbers: Vec<u32>,
}
