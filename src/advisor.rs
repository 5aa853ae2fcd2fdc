use crate::catalog::{self, Product};
use crate::dispatch::Dispatcher;
use crate::error::AdvisorError;
use crate::event::{AppEvent, ChatRequest};
use crate::selection::{store, SelectionStore, Toggle};
use crate::storage::KeyValueStore;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub const GREETING: &str = "Hi there! I'm your routine advisor. Select a few products, or ask me a question like \"What's a good routine for dry skin?\"";
pub const ROUTINE_REQUEST_LABEL: &str = "Generate a routine for my selected products.";
pub const EMPTY_SELECTION_NOTICE: &str =
    "Please select at least one product to generate a routine.";
pub const BUSY_NOTICE: &str = "Please wait for the current reply before sending another message.";
pub const ASK_FAILED: &str = "Could not get a response. Please try again later.";
pub const ROUTINE_FAILED: &str = "Could not generate a routine. Please try again.";
pub const CATALOG_FAILED: &str = "Could not load products. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    You,
    Advisor,
    Notice,
    Error,
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Self::You => "You",
            Self::Advisor => "Advisor",
            Self::Notice => "Notice",
            Self::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

impl TranscriptEntry {
    fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }
}

/// Application state plus one method per user gesture. The egui layer only
/// reads from it and calls these methods.
pub struct Advisor {
    dispatcher: Dispatcher,
    storage: Arc<dyn KeyValueStore>,
    selection: SelectionStore,
    categories: Vec<String>,
    active_category: Option<String>,
    displayed: Vec<Product>,
    catalog_loading: bool,
    transcript: Vec<TranscriptEntry>,
    pending: Option<ChatRequest>,
    detail: Option<Product>,
    diagnostics_log: Vec<String>,
}

impl Advisor {
    pub fn new(dispatcher: Dispatcher, storage: Arc<dyn KeyValueStore>) -> Self {
        let selection = store::load(storage.as_ref());
        Self {
            dispatcher,
            storage,
            selection,
            categories: Vec::new(),
            active_category: None,
            displayed: Vec::new(),
            catalog_loading: false,
            transcript: vec![TranscriptEntry::new(Speaker::Advisor, GREETING)],
            pending: None,
            detail: None,
            diagnostics_log: Vec::new(),
        }
    }

    /// Fetches the catalog once so the category filter has something to offer.
    pub fn start(&mut self) {
        self.catalog_loading = true;
        self.dispatcher.load_catalog(None);
    }

    /// True when the initial fetch failed and nothing is offered to pick from.
    pub fn can_retry_catalog(&self) -> bool {
        self.categories.is_empty() && !self.catalog_loading
    }

    pub fn retry_catalog(&mut self) {
        tracing::info!(category = ?self.active_category, "retrying catalog load");
        self.catalog_loading = true;
        self.dispatcher.load_catalog(self.active_category.clone());
    }

    fn timestamp() -> String {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(duration) => duration.as_secs().to_string(),
            Err(_) => "0".to_string(),
        }
    }

    fn log_diagnostic(&mut self, message: impl Into<String>) {
        self.diagnostics_log
            .push(format!("[{}] {}", Self::timestamp(), message.into()));
    }

    fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.transcript.push(TranscriptEntry::new(speaker, text));
    }

    fn persist(&mut self) {
        if let Err(err) = store::save(self.storage.as_ref(), &self.selection) {
            tracing::warn!(error = %err, "failed to persist selection");
            self.log_diagnostic(format!("failed to persist selection: {err}"));
        }
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn active_category(&self) -> Option<&str> {
        self.active_category.as_deref()
    }

    pub fn displayed_products(&self) -> &[Product] {
        &self.displayed
    }

    pub fn is_catalog_loading(&self) -> bool {
        self.catalog_loading
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn pending(&self) -> Option<ChatRequest> {
        self.pending
    }

    pub fn detail(&self) -> Option<&Product> {
        self.detail.as_ref()
    }

    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics_log
    }

    pub fn select_category(&mut self, category: impl Into<String>) {
        let category = category.into();
        tracing::debug!(category = %category, "category selected");
        self.active_category = Some(category.clone());
        self.catalog_loading = true;
        self.dispatcher.load_catalog(Some(category));
    }

    pub fn toggle_selection(&mut self, name: &str) {
        match self.selection.toggle(name, &self.displayed) {
            Toggle::Added | Toggle::Removed => self.persist(),
            Toggle::Unknown => {
                self.log_diagnostic(format!("toggle ignored for unknown product: {name}"));
            }
        }
    }

    pub fn remove_selection(&mut self, name: &str) {
        self.selection.remove(name);
        self.persist();
    }

    pub fn clear_selections(&mut self) {
        self.selection.clear();
        if let Err(err) = store::erase(self.storage.as_ref()) {
            tracing::warn!(error = %err, "failed to erase saved selection");
            self.log_diagnostic(format!("failed to erase saved selection: {err}"));
        }
    }

    pub fn submit_question(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        match self.dispatcher.ask(text.to_string()) {
            Ok(()) => {
                self.push(Speaker::You, text);
                self.pending = Some(ChatRequest::Question);
            }
            Err(err) => self.report_dispatch_error(err),
        }
    }

    pub fn generate_routine(&mut self) {
        match self
            .dispatcher
            .generate_routine(self.selection.to_snapshot_list())
        {
            Ok(()) => {
                self.push(Speaker::You, ROUTINE_REQUEST_LABEL);
                self.pending = Some(ChatRequest::Routine);
            }
            Err(err) => self.report_dispatch_error(err),
        }
    }

    fn report_dispatch_error(&mut self, err: AdvisorError) {
        self.log_diagnostic(format!("chat command rejected: {err}"));
        let notice = match err {
            AdvisorError::EmptySelection => EMPTY_SELECTION_NOTICE,
            AdvisorError::ChatBusy => BUSY_NOTICE,
            _ => ASK_FAILED,
        };
        self.push(Speaker::Notice, notice);
    }

    pub fn open_detail(&mut self, name: &str) {
        self.detail = self
            .displayed
            .iter()
            .find(|product| product.name == name)
            .cloned();
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::CatalogLoaded { category, result } => {
                self.apply_catalog(category, result)
            }
            AppEvent::ChatReplied { request, result } => {
                self.pending = None;
                match result {
                    Ok(reply) => self.push(Speaker::Advisor, reply),
                    Err(err) => {
                        tracing::error!(error = %err, ?request, "chat request failed");
                        self.log_diagnostic(format!("chat error: {err}"));
                        let text = match request {
                            ChatRequest::Question => ASK_FAILED,
                            ChatRequest::Routine => ROUTINE_FAILED,
                        };
                        self.push(Speaker::Error, text);
                    }
                }
            }
        }
    }

    fn apply_catalog(
        &mut self,
        category: Option<String>,
        result: Result<Vec<Product>, AdvisorError>,
    ) {
        // A newer category request supersedes this one.
        if category.is_some() && category != self.active_category {
            match &result {
                Ok(_) => tracing::debug!(?category, "dropping superseded catalog result"),
                Err(err) => {
                    tracing::debug!(?category, error = %err, "dropping superseded catalog failure");
                    self.log_diagnostic(format!("superseded catalog error: {err}"));
                }
            }
            return;
        }
        if category == self.active_category {
            self.catalog_loading = false;
        }

        let products = match result {
            Ok(products) => products,
            Err(err) => {
                tracing::error!(error = %err, "catalog load failed");
                self.log_diagnostic(format!("catalog error: {err}"));
                self.push(Speaker::Error, CATALOG_FAILED);
                return;
            }
        };

        for category in catalog::categories(&products) {
            if !self.categories.contains(&category) {
                self.categories.push(category);
            }
        }

        if let Some(category) = category {
            self.displayed = catalog::filter_by_category(&products, &category);
            tracing::debug!(
                category = %category,
                products = self.displayed.len(),
                "product grid updated"
            );
        }
    }
}
