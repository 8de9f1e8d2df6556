//! TextBlast - campaign engine entry point

mod demo;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use textblast_common::config::Config;
use textblast_core::{
    BatchPolicy, BulkSender, CampaignManager, FollowUpExecutor, FollowUpScheduler, FollowUpWorker,
    HttpGatewayTransport, MessageTransport, ResponseMonitor, SimulatedTransport,
    StoreRecipientResolver,
};
use textblast_storage::{
    CampaignRepository, ContactRepository, MemoryStore, MessageRepository,
    ScheduledFollowUpRepository, SequenceRepository, TemplateRepository,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("Starting TextBlast campaign engine...");

    let config = match Config::load() {
        Ok(config) => config,
        Err(_) => {
            info!("No configuration file found, using defaults");
            Config::default()
        }
    };

    let store = MemoryStore::new();
    let transport = build_transport(&config);
    info!("Using {} transport", config.transport.backend);

    let campaigns = CampaignRepository::new(store.clone());
    let contacts = ContactRepository::new(store.clone());
    let templates = TemplateRepository::new(store.clone());
    let sequences = SequenceRepository::new(store.clone());
    let messages = MessageRepository::new(store.clone());
    let scheduled = ScheduledFollowUpRepository::new(store.clone());

    let policy = BatchPolicy::from_config(&config.sending);
    let resolver = Arc::new(StoreRecipientResolver::new(
        contacts.clone(),
        templates.clone(),
    ));
    let sender = BulkSender::new(transport.clone(), messages.clone());
    let scheduler = FollowUpScheduler::new(scheduled.clone());
    let manager = Arc::new(CampaignManager::new(
        campaigns.clone(),
        sequences.clone(),
        resolver,
        sender,
        scheduler,
    ));
    let executor = FollowUpExecutor::new(
        scheduled.clone(),
        contacts,
        sequences,
        templates,
        messages.clone(),
        transport,
    );
    let monitor = ResponseMonitor::new(messages, scheduled.clone());

    if std::env::args().any(|arg| arg == "--demo") {
        return demo::run(store, manager, monitor, executor, &policy).await;
    }

    let worker = FollowUpWorker::new(executor, monitor, manager, campaigns, scheduled, policy)
        .with_poll_interval(config.worker.poll_interval_secs)
        .with_reply_sweep(config.worker.reply_sweep);

    let worker_handle = tokio::spawn(async move {
        worker.run().await;
    });

    info!("TextBlast started successfully");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    worker_handle.abort();

    info!("TextBlast shutdown complete");

    Ok(())
}

fn build_transport(config: &Config) -> Arc<dyn MessageTransport> {
    match config.transport.backend.as_str() {
        "http" => {
            let url = config.transport.gateway_url.clone().unwrap_or_default();
            Arc::new(HttpGatewayTransport::new(
                url,
                config.transport.gateway_api_key.clone(),
            ))
        }
        _ => Arc::new(
            SimulatedTransport::new(config.transport.failure_rate).with_latency(
                Duration::from_millis(config.transport.min_latency_ms),
                Duration::from_millis(config.transport.max_latency_ms),
            ),
        ),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,textblast=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true))
        .with(filter)
        .init();
}
