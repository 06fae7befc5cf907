mod config;
mod main_lib;

use config::Config;
use ledgerfolio_core::prices::BackfillWorker;
use ledgerfolio_core::transactions::TransactionServiceTrait;
use main_lib::{build_state, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let config = Config::from_env();
    let state = build_state(&config)?;

    // One-shot mode: rewrite derived fields from stored inputs and exit.
    if std::env::args().nth(1).as_deref() == Some("recalculate") {
        let summary = state.transaction_service.recalculate_all().await?;
        tracing::info!(
            "Recalculated {} transactions in {}: {} changed, {} unchanged, {} failed",
            summary.total,
            state.db_path,
            summary.changed,
            summary.unchanged,
            summary.failed.len()
        );
        return Ok(());
    }

    let worker = BackfillWorker::start(
        state.backfill_service.clone(),
        config.backfill_workers,
        config.backfill_queue,
    );
    let resumed = worker.resume_interrupted().await?;
    let submitted = worker.submit_pending().await?;
    tracing::info!(
        "Backfill worker started with {} tasks; resumed {} jobs, queued {} pending",
        config.backfill_workers,
        resumed.len(),
        submitted.len()
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down backfill worker");
    worker.shutdown().await;
    Ok(())
}
