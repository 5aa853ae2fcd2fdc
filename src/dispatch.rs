use crate::catalog::CatalogLoader;
use crate::chat::ChatSession;
use crate::error::AdvisorError;
use crate::event::{AppEvent, ChatRequest};
use crate::selection::SelectionEntry;
use std::sync::{mpsc, Arc};
use tokio::runtime::Handle;
use tokio::sync::Mutex;

/// Runs network work on the tokio runtime and reports back through `tx`.
///
/// The chat session sits behind a mutex that is taken with `try_lock_owned`
/// before anything is spawned, so at most one chat turn is ever in flight.
/// The guard is released before the reply is reported.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::Sender<AppEvent>,
    runtime_handle: Handle,
    catalog: Arc<CatalogLoader>,
    chat: Arc<Mutex<ChatSession>>,
}

impl Dispatcher {
    pub fn new(
        runtime_handle: Handle,
        tx: mpsc::Sender<AppEvent>,
        catalog: CatalogLoader,
        session: ChatSession,
    ) -> Self {
        Self {
            tx,
            runtime_handle,
            catalog: Arc::new(catalog),
            chat: Arc::new(Mutex::new(session)),
        }
    }

    pub fn load_catalog(&self, category: Option<String>) {
        let tx = self.tx.clone();
        let catalog = Arc::clone(&self.catalog);

        self.runtime_handle.spawn(async move {
            let result = catalog.load().await;
            let _ = tx.send(AppEvent::CatalogLoaded { category, result });
        });
    }

    pub fn ask(&self, text: String) -> Result<(), AdvisorError> {
        let mut session = Arc::clone(&self.chat)
            .try_lock_owned()
            .map_err(|_| AdvisorError::ChatBusy)?;
        let tx = self.tx.clone();

        self.runtime_handle.spawn(async move {
            let result = session.ask(&text).await;
            tracing::debug!(
                messages = session.history().messages().len(),
                ok = result.is_ok(),
                "question finished"
            );
            drop(session);
            let _ = tx.send(AppEvent::ChatReplied {
                request: ChatRequest::Question,
                result,
            });
        });
        Ok(())
    }

    pub fn generate_routine(&self, entries: Vec<SelectionEntry>) -> Result<(), AdvisorError> {
        if entries.is_empty() {
            return Err(AdvisorError::EmptySelection);
        }
        let mut session = Arc::clone(&self.chat)
            .try_lock_owned()
            .map_err(|_| AdvisorError::ChatBusy)?;
        let tx = self.tx.clone();

        self.runtime_handle.spawn(async move {
            let result = session.generate_routine(&entries).await;
            tracing::debug!(
                messages = session.history().messages().len(),
                products = entries.len(),
                ok = result.is_ok(),
                "routine request finished"
            );
            drop(session);
            let _ = tx.send(AppEvent::ChatReplied {
                request: ChatRequest::Routine,
                result,
            });
        });
        Ok(())
    }
}
