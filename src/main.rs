//! # Trade Kernel
//!
//! Main entry point for the trade lifecycle kernel service.

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

use trade_kernel::api::rest::handlers::AppState;
use trade_kernel::api::rest::routes::create_router;
use trade_kernel::application::services::escrow_ledger::{EscrowCustodian, EscrowLedger};
use trade_kernel::application::services::guard_evaluator::{ComplianceProvider, GuardEvaluator};
use trade_kernel::application::services::locks::TradeLocks;
use trade_kernel::application::use_cases::create_trade::CreateTrade;
use trade_kernel::application::use_cases::get_trade_state::GetTradeState;
use trade_kernel::application::use_cases::transition_trade::TransitionEngine;
use trade_kernel::config::AppConfig;
use trade_kernel::infrastructure::collaborators::compliance::{
    HttpComplianceProvider, StaticComplianceProvider,
};
use trade_kernel::infrastructure::collaborators::custodian::{HttpCustodian, InMemoryCustodian};
use trade_kernel::infrastructure::collaborators::notifier::TracingNotifier;
use trade_kernel::infrastructure::persistence::in_memory::InMemoryKernelStore;
use trade_kernel::infrastructure::persistence::postgres::PostgresKernelStore;
use trade_kernel::infrastructure::persistence::traits::KernelStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.log.level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .init();

    info!("Starting Trade Kernel v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn KernelStore> = match &config.database.url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(url)
                .await?;
            let store = PostgresKernelStore::new(pool);
            store.ensure_schema().await?;
            info!("using PostgreSQL store");
            Arc::new(store)
        }
        None => {
            info!("using in-memory store");
            Arc::new(InMemoryKernelStore::new())
        }
    };

    let timeout = config.collaborators.timeout();
    let compliance: Arc<dyn ComplianceProvider> = match &config.collaborators.compliance_url {
        Some(url) => Arc::new(HttpComplianceProvider::new(url.clone(), timeout)?),
        None => Arc::new(StaticComplianceProvider::new()),
    };
    let custodian: Arc<dyn EscrowCustodian> = match &config.collaborators.custodian_url {
        Some(url) => Arc::new(HttpCustodian::new(url.clone(), timeout)?),
        None => Arc::new(InMemoryCustodian::new()),
    };

    let locks = Arc::new(TradeLocks::new());
    let guards = GuardEvaluator::new(compliance, timeout);
    let escrow = EscrowLedger::new(store.clone(), custodian, locks.clone(), timeout);
    let engine = TransitionEngine::new(
        store.clone(),
        guards.clone(),
        escrow.clone(),
        Arc::new(TracingNotifier::new()),
        locks,
    );
    let state = Arc::new(AppState {
        create_trade: CreateTrade::new(store.clone()),
        engine,
        reader: GetTradeState::new(store, guards),
        escrow,
    });

    let addr = config.rest.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "REST server listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    info!("Shutting down Trade Kernel");
    Ok(())
}
