#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdvisorError {
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("no products selected")]
    EmptySelection,
    #[error("completion service error{}: {message}", status_suffix(.status))]
    RemoteService {
        status: Option<u16>,
        message: String,
    },
    #[error("a chat request is already in progress")]
    ChatBusy,
    #[error("storage error: {0}")]
    Storage(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(status) => format!(" (HTTP {status})"),
        None => String::new(),
    }
}

impl AdvisorError {
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::RemoteService {
            status,
            message: message.into(),
        }
    }
}
