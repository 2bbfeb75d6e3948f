//! # Inbound Port - SignatureFreezeApi
//!
//! | Method | Caller |
//! |--------|--------|
//! | `on_block_received` | `BlockData` handler |
//! | `on_signature_received` | `BlockSignature` handler |
//! | `on_signatures_chunk` | `BlockSignatures` / `SignaturesChunk` handlers |
//! | `accept_local_new_block` | Handlers after new transactions, runtime loop |

use crate::domain::{AcceptOutcome, BlockOutcome, SigFreezeOutcome, SignatureOutcome};
use crate::error::FreezeResult;
use shared_types::messages::{SignatureMessage, SignaturesChunk};
use shared_types::{Block, EndpointId};

pub trait SignatureFreezeApi: Send + Sync {
    fn on_block_received(
        &self,
        block: Block,
        origin: Option<&EndpointId>,
    ) -> FreezeResult<BlockOutcome>;

    fn on_signature_received(
        &self,
        message: SignatureMessage,
        origin: Option<&EndpointId>,
    ) -> FreezeResult<SignatureOutcome>;

    /// Incremental batches add signatures one by one; frozen batches are
    /// sigfreeze announcements.
    fn on_signatures_chunk(
        &self,
        chunk: SignaturesChunk,
        origin: Option<&EndpointId>,
    ) -> FreezeResult<Vec<SignatureOutcome>>;

    fn on_sig_freeze(
        &self,
        chunk: SignaturesChunk,
        origin: Option<&EndpointId>,
    ) -> FreezeResult<SigFreezeOutcome>;

    fn accept_local_new_block(&self) -> FreezeResult<AcceptOutcome>;

    fn local_candidate(&self) -> FreezeResult<Option<Block>>;
}
