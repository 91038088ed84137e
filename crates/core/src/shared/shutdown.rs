use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// Creates a linked trigger/signal pair.
///
/// The signal fires when the trigger is fired or dropped. Workers select on
/// [`ShutdownSignal::receiver`] next to every blocking channel operation so
/// an indefinite wait can always be interrupted.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = crossbeam_channel::bounded::<()>(0);
    (ShutdownTrigger { tx: Some(tx) }, ShutdownSignal { rx })
}

pub struct ShutdownTrigger {
    tx: Option<Sender<()>>,
}

impl ShutdownTrigger {
    /// Fires the signal. Idempotent.
    pub fn fire(&mut self) {
        self.tx.take();
    }

    pub fn is_fired(&self) -> bool {
        self.tx.is_none()
    }
}

#[derive(Clone, Debug)]
pub struct ShutdownSignal {
    rx: Receiver<()>,
}

impl ShutdownSignal {
    /// Receiver that becomes ready (disconnected) once shutdown fires.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }

    pub fn is_fired(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }
}
