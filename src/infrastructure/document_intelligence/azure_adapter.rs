use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use serde::Deserialize;

use crate::application::ports::{DocumentAnalyzer, DocumentAnalyzerError};
use crate::domain::{
    BoundingRegion, DocumentAnalysis, Figure, Line, Page, Span, Table, TableCell,
};

pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(300);
pub const INITIAL_BACKOFF: Duration = Duration::from_secs(2);
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);
pub const API_VERSION: &str = "2024-11-30";

/// Azure Document Intelligence adapter. Submits the document to the
/// prebuilt-layout model with markdown output, polls the returned
/// operation until it reaches a terminal state, and flattens the result
/// into [`DocumentAnalysis`].
pub struct AzureDocIntelligenceAdapter {
    client: Client,
    endpoint: String,
    api_key: String,
    poll_timeout: Duration,
}

impl AzureDocIntelligenceAdapter {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client build never fails with valid TLS config");
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    /// Overall budget for the poll-to-completion phase. Large documents
    /// can take minutes to analyze.
    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    async fn submit(&self, data: &[u8]) -> Result<String, DocumentAnalyzerError> {
        let b64 = general_purpose::STANDARD.encode(data);
        let body = serde_json::json!({ "base64Source": b64 });

        let url = format!(
            "{}/documentintelligence/documentModels/prebuilt-layout:analyze?api-version={}&outputContentFormat=markdown&output=figures",
            self.endpoint, API_VERSION
        );

        let response = self
            .client
            .post(&url)
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                DocumentAnalyzerError::AnalysisFailed(format!("submit failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(DocumentAnalyzerError::AnalysisFailed(format!(
                "submit returned {status}: {text}"
            )));
        }

        let operation_url = response
            .headers()
            .get("Operation-Location")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                DocumentAnalyzerError::AnalysisFailed(
                    "response missing Operation-Location header".to_string(),
                )
            })?
            .to_string();

        Ok(operation_url)
    }

    async fn poll_until_complete(
        &self,
        operation_url: &str,
    ) -> Result<AnalyzeResult, DocumentAnalyzerError> {
        let poll_future = async {
            let mut backoff = INITIAL_BACKOFF;

            loop {
                let response = self
                    .client
                    .get(operation_url)
                    .header("Ocp-Apim-Subscription-Key", &self.api_key)
                    .send()
                    .await
                    .map_err(|e| {
                        DocumentAnalyzerError::AnalysisFailed(format!("poll request failed: {e}"))
                    })?;

                if response.status().as_u16() == 429 {
                    let retry_after = response
                        .headers()
                        .get("Retry-After")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(backoff.as_secs());
                    tokio::time::sleep(Duration::from_secs(retry_after)).await;
                    continue;
                }

                if !response.status().is_success() {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    return Err(DocumentAnalyzerError::AnalysisFailed(format!(
                        "poll returned {status}: {text}"
                    )));
                }

                let result: AnalyzeResponse = response.json().await.map_err(|e| {
                    DocumentAnalyzerError::AnalysisFailed(format!("response parse failed: {e}"))
                })?;

                match result.status.as_str() {
                    "succeeded" => {
                        return result.analyze_result.ok_or_else(|| {
                            DocumentAnalyzerError::AnalysisFailed(
                                "succeeded operation carried no analyzeResult".to_string(),
                            )
                        });
                    }
                    "failed" => {
                        return Err(DocumentAnalyzerError::AnalysisFailed(
                            "layout analysis reported failure".to_string(),
                        ));
                    }
                    _ => {
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                    }
                }
            }
        };

        tokio::time::timeout(self.poll_timeout, poll_future)
            .await
            .map_err(|_| {
                DocumentAnalyzerError::AnalysisFailed(format!(
                    "polling timed out after {}s",
                    self.poll_timeout.as_secs()
                ))
            })?
    }
}

#[async_trait]
impl DocumentAnalyzer for AzureDocIntelligenceAdapter {
    #[tracing::instrument(skip(self, data), fields(bytes = data.len()))]
    async fn analyze(&self, data: &[u8]) -> Result<DocumentAnalysis, DocumentAnalyzerError> {
        if data.is_empty() {
            return Err(DocumentAnalyzerError::EmptyDocument);
        }

        let operation_url = self.submit(data).await?;
        let result = self.poll_until_complete(&operation_url).await?;

        Ok(flatten_analyze_result(result))
    }
}

/// Maps the service's object graph into the application-owned shape.
///
/// Tables and figures are attached to every page whose number appears
/// in one of their bounding regions; a structure spanning pages shows
/// up under each of them.
pub fn flatten_analyze_result(result: AnalyzeResult) -> DocumentAnalysis {
    let pages = result
        .pages
        .into_iter()
        .map(|page| {
            let lines = page
                .lines
                .into_iter()
                .map(|line| Line {
                    content: line.content,
                    polygon: line.polygon,
                    spans: line
                        .spans
                        .into_iter()
                        .map(|s| Span {
                            offset: s.offset,
                            length: s.length,
                        })
                        .collect(),
                })
                .collect();

            let mut tables = Vec::new();
            for table in &result.tables {
                for region in &table.bounding_regions {
                    if region.page_number == page.page_number {
                        tables.push(Table {
                            row_count: table.row_count,
                            column_count: table.column_count,
                            cells: table
                                .cells
                                .iter()
                                .map(|cell| TableCell {
                                    row_index: cell.row_index,
                                    column_index: cell.column_index,
                                    content: cell.content.clone(),
                                    bounding_regions: cell
                                        .bounding_regions
                                        .iter()
                                        .map(map_region)
                                        .collect(),
                                })
                                .collect(),
                        });
                    }
                }
            }

            let mut figures = Vec::new();
            for figure in &result.figures {
                for region in &figure.bounding_regions {
                    if region.page_number == page.page_number {
                        figures.push(Figure {
                            id: figure.id.clone(),
                            bounding_regions: figure
                                .bounding_regions
                                .iter()
                                .map(map_region)
                                .collect(),
                            spans: figure
                                .spans
                                .iter()
                                .map(|s| Span {
                                    offset: s.offset,
                                    length: s.length,
                                })
                                .collect(),
                            elements: figure.elements.clone(),
                        });
                    }
                }
            }

            Page {
                page_number: page.page_number,
                width: page.width,
                height: page.height,
                lines,
                tables,
                figures,
            }
        })
        .collect();

    DocumentAnalysis {
        content_markdown: result.content,
        pages,
    }
}

fn map_region(region: &ApiBoundingRegion) -> BoundingRegion {
    BoundingRegion {
        page_number: region.page_number,
        polygon: region.polygon.clone(),
    }
}

#[derive(Deserialize)]
pub struct AnalyzeResponse {
    pub status: String,
    #[serde(rename = "analyzeResult")]
    pub analyze_result: Option<AnalyzeResult>,
}

#[derive(Deserialize)]
pub struct AnalyzeResult {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub pages: Vec<ApiPage>,
    #[serde(default)]
    pub tables: Vec<ApiTable>,
    #[serde(default)]
    pub figures: Vec<ApiFigure>,
}

#[derive(Deserialize)]
pub struct ApiPage {
    #[serde(rename = "pageNumber")]
    pub page_number: u32,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub lines: Vec<ApiLine>,
}

#[derive(Deserialize)]
pub struct ApiLine {
    pub content: String,
    #[serde(default)]
    pub polygon: Vec<f64>,
    #[serde(default)]
    pub spans: Vec<ApiSpan>,
}

#[derive(Deserialize)]
pub struct ApiSpan {
    pub offset: u64,
    pub length: u64,
}

#[derive(Deserialize)]
pub struct ApiTable {
    #[serde(rename = "rowCount")]
    pub row_count: u32,
    #[serde(rename = "columnCount")]
    pub column_count: u32,
    #[serde(default)]
    pub cells: Vec<ApiTableCell>,
    #[serde(rename = "boundingRegions", default)]
    pub bounding_regions: Vec<ApiBoundingRegion>,
}

#[derive(Deserialize)]
pub struct ApiTableCell {
    #[serde(rename = "rowIndex")]
    pub row_index: u32,
    #[serde(rename = "columnIndex")]
    pub column_index: u32,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "boundingRegions", default)]
    pub bounding_regions: Vec<ApiBoundingRegion>,
}

#[derive(Deserialize)]
pub struct ApiFigure {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "boundingRegions", default)]
    pub bounding_regions: Vec<ApiBoundingRegion>,
    #[serde(default)]
    pub spans: Vec<ApiSpan>,
    #[serde(default)]
    pub elements: Vec<String>,
}

#[derive(Deserialize)]
pub struct ApiBoundingRegion {
    #[serde(rename = "pageNumber")]
    pub page_number: u32,
    #[serde(default)]
    pub polygon: Vec<f64>,
}
