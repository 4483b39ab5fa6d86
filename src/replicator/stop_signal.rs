use tokio::sync::watch;

/// Dropping the Stopper (or calling `stop()`) tells the paired task to exit.
pub(crate) struct Stopper {
    stop_signal: watch::Sender<bool>,
}

#[derive(Clone)]
pub(crate) struct StopCheck {
    stop_signal: watch::Receiver<bool>,
}

impl Stopper {
    pub(crate) fn stop(self) {
        // Drop impl does the work.
    }
}

impl Drop for Stopper {
    fn drop(&mut self) {
        let _ = self.stop_signal.send(true);
    }
}

impl StopCheck {
    pub(crate) fn should_stop(&self) -> bool {
        *self.stop_signal.borrow()
    }

    /// Resolves once stop has been signaled. Used in `select!` against fetches and sleeps.
    pub(crate) async fn stopped(&mut self) {
        while !*self.stop_signal.borrow() {
            if self.stop_signal.changed().await.is_err() {
                return;
            }
        }
    }
}

pub(crate) fn new() -> (Stopper, StopCheck) {
    let (tx, rx) = watch::channel(false);

    (Stopper { stop_signal: tx }, StopCheck { stop_signal: rx })
}
