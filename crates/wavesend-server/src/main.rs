//! Wavesend - campaign delivery server entry point

use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wavesend_api::AppState;
use wavesend_common::config::Config;
use wavesend_core::{
    CampaignManager, CompletionChecker, DeliveryWorker, DispatchQueue, HttpDeliveryClient, Poller,
};
use wavesend_storage::db::DatabasePool;
use wavesend_storage::repository::{
    CampaignRepository, ContactListRepository, ContactRepository, JobRepository,
    MessageRepository, SettingsRepository,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so logging can honor it
    let config = Config::load()?;
    init_logging(&config);

    info!("Starting Wavesend server...");

    // Initialize database
    let db_pool = DatabasePool::new(&config.database).await?;
    info!("Database connection established");

    db_pool.migrate().await?;
    info!("Database migrations completed");

    let pool = db_pool.pool().clone();
    let campaigns = Arc::new(CampaignRepository::new(pool.clone()));
    let messages = Arc::new(MessageRepository::new(pool.clone()));
    let contacts = Arc::new(ContactRepository::new(pool.clone()));
    let contact_lists = Arc::new(ContactListRepository::new(pool.clone()));
    let settings = Arc::new(SettingsRepository::new(pool.clone()));
    let jobs = Arc::new(JobRepository::new(pool));

    let manager = Arc::new(CampaignManager::new(
        campaigns.clone(),
        messages.clone(),
        contacts.clone(),
        contact_lists.clone(),
        settings.clone(),
    ));

    let queue = DispatchQueue::new(
        jobs,
        config.worker.max_attempts,
        config.worker.retry_base_delay_secs,
    );

    let delivery_client = Arc::new(HttpDeliveryClient::new(&config.delivery)?);

    let shutdown = CancellationToken::new();

    // Poller: promotes due messages into the dispatch queue
    let poller_handle = {
        let poller = Poller::new(
            campaigns.clone(),
            messages.clone(),
            queue.clone(),
            &config.worker,
        );
        let token = shutdown.clone();
        tokio::spawn(poller.run(token))
    };

    // Delivery worker: drains the queue serially
    let worker_handle = {
        let worker = DeliveryWorker::new(
            messages.clone(),
            campaigns.clone(),
            contacts.clone(),
            settings.clone(),
            queue.clone(),
            delivery_client,
            &config.delivery,
            &config.worker,
        );
        let token = shutdown.clone();
        tokio::spawn(worker.run(token))
    };

    // Completion checker: reconciles campaign status
    let checker_handle = {
        let checker = CompletionChecker::new(campaigns.clone(), messages.clone(), &config.worker);
        let token = shutdown.clone();
        tokio::spawn(checker.run(token))
    };

    // API server
    let state = AppState::new(
        campaigns,
        messages,
        contacts,
        contact_lists,
        settings,
        manager,
        Some(db_pool),
    );
    let bind = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("API server listening on {}", bind);

    let api_shutdown = shutdown.clone();
    let api_handle = tokio::spawn(async move {
        let app = wavesend_api::create_router(state);
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { api_shutdown.cancelled().await })
            .await;
        if let Err(e) = result {
            tracing::error!("API server error: {}", e);
        }
    });

    info!("Wavesend server started successfully");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    // Stop the loops; an in-flight delivery finishes before the worker
    // observes the cancellation
    shutdown.cancel();
    let _ = poller_handle.await;
    let _ = worker_handle.await;
    let _ = checker_handle.await;
    let _ = api_handle.await;

    info!("Wavesend server shutdown complete");

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},wavesend=debug", config.logging.level)));

    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(filter)
            .init();
    }
}
