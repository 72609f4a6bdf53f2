//! The result channel.
//!
//! One bounded FIFO carries every outbound event from the task handlers and
//! the alarm monitor to the single delivery consumer. Producers hold cheap
//! [`ResultQueue`] clones; the consumer owns the only [`ResultReceiver`].

use tokio::sync::mpsc;

use camerabot_shared::events::OutboundEvent;
use camerabot_shared::HandlerError;

/// Create the result channel with room for `capacity` pending events.
pub fn result_channel(capacity: usize) -> (ResultQueue, ResultReceiver) {
    let (tx, rx) = mpsc::channel::<OutboundEvent>(capacity.max(1));
    (ResultQueue { tx }, ResultReceiver { rx })
}

/// Producer side of the result channel.
#[derive(Debug, Clone)]
pub struct ResultQueue {
    tx: mpsc::Sender<OutboundEvent>,
}

impl ResultQueue {
    /// Enqueue an event, waiting only while the channel is full.
    pub async fn put(&self, event: OutboundEvent) -> Result<(), HandlerError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| HandlerError::ResultChannelClosed)
    }
}

/// Consumer side of the result channel.
#[derive(Debug)]
pub struct ResultReceiver {
    rx: mpsc::Receiver<OutboundEvent>,
}

impl ResultReceiver {
    /// Next event in submission order, or `None` once every producer is gone.
    pub async fn get(&mut self) -> Option<OutboundEvent> {
        self.rx.recv().await
    }

    pub fn try_get(&mut self) -> Option<OutboundEvent> {
        self.rx.try_recv().ok()
    }
}
