use log::*;
use loyalty_engine::{
    accrual::{AccrualLoop, OracleTransport, ShutdownSignal},
    AccrualStore,
};
use tokio::task::JoinHandle;

/// Starts the accrual worker. The returned handle resolves, with the number of cycles run, once `shutdown` has been
/// raised and the loop has wound down.
pub fn start_accrual_worker<S, T>(mut accrual_loop: AccrualLoop<S, T>, shutdown: ShutdownSignal) -> JoinHandle<u64>
where
    S: AccrualStore,
    T: OracleTransport,
{
    tokio::spawn(async move {
        info!("🔄️ Accrual worker started");
        let cycles = accrual_loop.run(shutdown).await;
        info!("🔄️ Accrual worker finished after {cycles} cycles");
        cycles
    })
}
