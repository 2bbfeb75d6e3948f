//! # Inbound Port - ProtocolApi
//!
//! | Method | Caller |
//! |--------|--------|
//! | `handle_message` | Transport, tests |
//! | `on_message` | Transport receive loop |

use crate::domain::{MessageOutcome, ProtocolResult};
use shared_types::EndpointId;

pub trait ProtocolApi: Send + Sync {
    /// Decodes and dispatches one inbound message with a raw code.
    fn handle_message(
        &self,
        endpoint: &EndpointId,
        code: u16,
        payload: &[u8],
    ) -> ProtocolResult<MessageOutcome>;

    /// Like `handle_message`, but failures are logged and the message
    /// dropped.
    fn on_message(&self, endpoint: &EndpointId, code: u16, payload: &[u8]);
}
