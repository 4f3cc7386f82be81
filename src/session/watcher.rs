use chrono::Utc;
use tokio::{sync::mpsc, task::JoinHandle, time};
use tracing::{debug, info};

use super::Session;

/// Signals emitted when an armed session runs out.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionExpired {
    pub generation: u64,
}

/// Fires once when the watched session reaches its expiry.
///
/// A single timer is scheduled for the session's remaining lifetime. Arming again
/// replaces it, and dropping the watcher cancels it.
pub struct ExpiryWatcher {
    tx: mpsc::Sender<SessionExpired>,
    timer: Option<JoinHandle<()>>,
}

impl ExpiryWatcher {
    pub fn new(tx: mpsc::Sender<SessionExpired>) -> Self {
        ExpiryWatcher { tx, timer: None }
    }

    pub fn arm(&mut self, session: &Session, generation: u64) {
        self.disarm();
        let remaining = session
            .remaining(Utc::now())
            .to_std()
            .unwrap_or_default();
        debug!("Expiry check armed for {}s", remaining.as_secs());

        let tx = self.tx.clone();
        self.timer = Some(tokio::spawn(async move {
            time::sleep(remaining).await;
            info!("Session expired");
            let _ = tx.send(SessionExpired { generation }).await;
        }));
    }

    pub fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for ExpiryWatcher {
    fn drop(&mut self) {
        self.disarm();
    }
}
