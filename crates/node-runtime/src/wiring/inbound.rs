//! Hands inbound transport frames to the protocol handlers.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use ixi_06_protocol::ProtocolApi;
use shared_types::EndpointId;

/// One frame received from a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub endpoint: EndpointId,
    pub code: u16,
    pub payload: Vec<u8>,
}

/// Feeds inbound frames to a [`ProtocolApi`] one at a time.
pub struct InboundDispatcher {
    protocol: Arc<dyn ProtocolApi>,
    receiver: mpsc::Receiver<InboundMessage>,
}

impl InboundDispatcher {
    /// Create the dispatcher and the sender the transport pushes frames into.
    pub fn new(
        protocol: Arc<dyn ProtocolApi>,
        capacity: usize,
    ) -> (Self, mpsc::Sender<InboundMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { protocol, receiver }, sender)
    }

    /// Dispatch until every sender is gone or `shutdown` becomes `true`.
    /// Returns the number of frames handled.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> usize {
        let mut handled = 0;
        loop {
            tokio::select! {
                message = self.receiver.recv() => {
                    let Some(message) = message else { break };
                    debug!(endpoint = %message.endpoint, code = message.code, "Inbound message");
                    self.protocol
                        .on_message(&message.endpoint, message.code, &message.payload);
                    handled += 1;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!(handled, "Inbound dispatcher stopped");
        handled
    }
}
