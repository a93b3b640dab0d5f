//! In-process message bus.
//!
//! Every engine that shares one `LocalMessageBus` behaves like a node subscribed to
//! the same pub/sub channel: a publish reaches every subscriber, the publisher
//! included, with the envelope unchanged.

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::sync::broadcast;

use crate::domain::{BusError, ChatEnvelope, MessageBus};

const DEFAULT_CAPACITY: usize = 1024;

pub struct LocalMessageBus {
    sender: broadcast::Sender<ChatEnvelope>,
}

impl LocalMessageBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// `capacity` envelopes may be buffered per subscriber before the slowest one lags.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }
}

impl Default for LocalMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for LocalMessageBus {
    async fn publish(&self, envelope: ChatEnvelope) -> Result<(), BusError> {
        // No subscribers is not an error: the envelope simply reaches nobody.
        let receivers = self.sender.send(envelope).unwrap_or(0);
        tracing::trace!("Published envelope to {} subscriber(s)", receivers);
        Ok(())
    }

    fn subscribe(&self) -> BoxStream<'static, ChatEnvelope> {
        let receiver = self.sender.subscribe();
        stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(envelope) => return Some((envelope, receiver)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Bus subscriber lagged, {} envelope(s) skipped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }
}
