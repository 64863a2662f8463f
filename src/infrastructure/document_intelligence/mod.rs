mod azure_adapter;

pub use azure_adapter::{
    flatten_analyze_result, AnalyzeResponse, AnalyzeResult, AzureDocIntelligenceAdapter,
    API_VERSION, DEFAULT_POLL_TIMEOUT, INITIAL_BACKOFF, MAX_BACKOFF,
};
