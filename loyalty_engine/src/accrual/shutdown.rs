//! A one-way shutdown flag, shared by the accrual loop and its dispatcher.
//!
//! The flag is a `watch` channel carrying a single `bool`. Dropping the [`ShutdownTrigger`] counts as raising it, so an
//! owner that goes away without cleaning up can never leave the loop running unattended.
use log::*;
use tokio::sync::watch;

/// Creates a connected trigger/signal pair. The signal may be cloned as often as needed.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        info!("🔄️ Shutdown requested");
        self.tx.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_raised(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once shutdown has been requested (or the trigger has been dropped). Cancel-safe.
    pub async fn raised(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
