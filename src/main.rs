mod advisor;
mod app;
mod catalog;
mod chat;
mod config;
mod dispatch;
mod error;
mod event;
mod logging;
mod selection;
mod storage;
mod theme;

use advisor::Advisor;
use app::BlushApp;
use catalog::CatalogLoader;
use chat::{ChatSession, HttpCompletionClient, SYSTEM_PROMPT};
use config::AppConfig;
use dispatch::Dispatcher;
use eframe::egui;
use std::sync::{mpsc, Arc};
use storage::FileKeyValueStore;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();
    logging::init_tracing(&config.logging);
    tracing::info!(
        catalog = %config.catalog.describe(),
        endpoint = %config.completion.endpoint,
        model = %config.completion.model,
        data_dir = %config.data_dir.display(),
        "starting blush"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("blush-runtime")
        .build()?;

    let (tx, rx) = mpsc::channel();
    let completion = HttpCompletionClient::new(&config.completion)?;
    let session = ChatSession::new(Arc::new(completion), SYSTEM_PROMPT);
    let dispatcher = Dispatcher::new(
        runtime.handle().clone(),
        tx,
        CatalogLoader::new(config.catalog.clone()),
        session,
    );
    let storage = Arc::new(FileKeyValueStore::new(config.storage_dir()));
    let advisor = Advisor::new(dispatcher, storage);

    let app = BlushApp::new(rx, advisor);
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([960.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Blush",
        native_options,
        Box::new(move |_creation_context| Ok(Box::new(app))),
    )?;

    Ok(())
}
