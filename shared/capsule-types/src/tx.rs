use alloy_primitives::TxHash;
use tokio::sync::mpsc;

/// Lifecycle events of a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TxEvent {
    /// The signer broadcast the transaction.
    Submitted(TxHash),
    /// The transaction was mined successfully.
    Confirmed(TxHash),
    /// Signing, broadcast or execution failed.
    Failed(String),
}

impl TxEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TxEvent::Submitted(_))
    }
}

/// Receiving end of a single transaction's lifecycle.
#[derive(Debug)]
pub struct TxHandle {
    events: mpsc::UnboundedReceiver<TxEvent>,
}

impl TxHandle {
    pub fn new(events: mpsc::UnboundedReceiver<TxEvent>) -> Self {
        Self { events }
    }

    /// Create a handle plus the sender the contract layer reports through.
    pub fn channel() -> (mpsc::UnboundedSender<TxEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx))
    }

    /// Next lifecycle event; `None` once the contract layer dropped its sender.
    pub async fn next_event(&mut self) -> Option<TxEvent> {
        self.events.recv().await
    }
}
