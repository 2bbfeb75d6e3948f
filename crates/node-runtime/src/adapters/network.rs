//! # Outbound Network Adapter
//!
//! `PeerNetwork` implementation that hands every outbound message to a
//! tokio channel. The transport task owns the receiving end and does the
//! actual framing and delivery.
//!
//! ```text
//! pool / inventory / freeze ──send_data/broadcast──→ ChannelNetwork
//!                                                        │ mpsc
//!                                                        ↓
//!                                                 transport task
//! ```

use tokio::sync::mpsc;
use tracing::{debug, warn};

use shared_types::{EndpointId, NodeType, PeerNetwork, ProtocolMessageCode};

/// Destination of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundTarget {
    Endpoint(EndpointId),
    Broadcast {
        node_types: Vec<NodeType>,
        skip: Option<EndpointId>,
    },
}

/// One queued outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub target: OutboundTarget,
    pub code: ProtocolMessageCode,
    pub payload: Vec<u8>,
}

/// Queues outbound messages for the transport task.
#[derive(Debug, Clone)]
pub struct ChannelNetwork {
    sender: mpsc::UnboundedSender<OutboundMessage>,
}

impl ChannelNetwork {
    /// Create the adapter and the receiver the transport drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn enqueue(&self, message: OutboundMessage) -> bool {
        let code = message.code;
        match self.sender.send(message) {
            Ok(()) => {
                debug!(%code, "Outbound message queued");
                true
            }
            Err(_) => {
                warn!(%code, "Outbound queue closed, message dropped");
                false
            }
        }
    }
}

impl PeerNetwork for ChannelNetwork {
    fn send_data(
        &self,
        endpoint: &EndpointId,
        code: ProtocolMessageCode,
        payload: Vec<u8>,
    ) -> bool {
        self.enqueue(OutboundMessage {
            target: OutboundTarget::Endpoint(endpoint.clone()),
            code,
            payload,
        })
    }

    fn broadcast(
        &self,
        node_types: &[NodeType],
        code: ProtocolMessageCode,
        payload: Vec<u8>,
        skip: Option<&EndpointId>,
    ) -> bool {
        self.enqueue(OutboundMessage {
            target: OutboundTarget::Broadcast {
                node_types: node_types.to_vec(),
                skip: skip.cloned(),
            },
            code,
            payload,
        })
    }
}
