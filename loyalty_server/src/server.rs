use log::*;
use loyalty_engine::{
    accrual::{shutdown_channel, AccrualClient, AccrualLoop, HttpOracle},
    LoyaltyDatabase,
    SqliteDatabase,
};

use crate::{accrual_worker::start_accrual_worker, config::ServerConfig, errors::ServerError};

/// Runs the server until Ctrl-C is received.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    config.validate()?;
    let mut db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Could not migrate the database. {e}")))?;

    let accrual = config.accrual_config();
    let oracle = HttpOracle::new(&accrual.oracle_url, accrual.retry.attempt_timeout)
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🚀️ Accrual service is at {}", oracle.base_url());
    let client = AccrualClient::new(oracle, accrual.retry);
    let accrual_loop = AccrualLoop::new(db.clone(), client, accrual);

    let (trigger, shutdown) = shutdown_channel();
    let worker = start_accrual_worker(accrual_loop, shutdown);

    tokio::signal::ctrl_c().await?;
    info!("🚀️ Shutdown requested. Waiting up to {:?} for in-flight orders.", accrual.shutdown_grace_period);
    trigger.trigger();
    let result = worker.await.map_err(|e| ServerError::Unspecified(format!("Accrual worker failed. {e}")));

    if let Err(e) = db.close().await {
        warn!("🚀️ Could not close the database cleanly. {e}");
    }
    result.map(|cycles| debug!("🚀️ Accrual worker ran {cycles} cycles"))
}
