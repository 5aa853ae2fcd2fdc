use crate::catalog::Product;
use crate::error::AdvisorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRequest {
    Question,
    Routine,
}

/// Results produced on the runtime and folded into UI state on the main thread.
#[derive(Debug, Clone)]
pub enum AppEvent {
    CatalogLoaded {
        category: Option<String>,
        result: Result<Vec<Product>, AdvisorError>,
    },
    ChatReplied {
        request: ChatRequest,
        result: Result<String, AdvisorError>,
    },
}
