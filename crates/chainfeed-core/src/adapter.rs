//! Block adapter: block record → block envelope.

use prost::Message;

use crate::block::Block;
use crate::envelope::{BlockEnvelope, EnvelopeHeader, PayloadKind, PAYLOAD_VERSION};
use crate::error::EnvelopeError;

/// Number of blocks behind the head considered irreversible.
pub const LIB_LAG: u64 = 1;

/// Wrap a decoded block for downstream transport.
///
/// Fails only when the block cannot be serialized, which means an internal
/// invariant was broken rather than bad input.
pub fn to_envelope(block: &Block) -> Result<BlockEnvelope, EnvelopeError> {
    let mut content = Vec::with_capacity(block.encoded_len());
    block.encode(&mut content)?;

    let header = EnvelopeHeader {
        id: block.id(),
        number: block.number(),
        previous_id: block.previous_id(),
        timestamp: block.time(),
        lib_num: block.number().saturating_sub(LIB_LAG),
        payload_kind: PayloadKind::Unknown,
        payload_version: PAYLOAD_VERSION,
    };
    Ok(header.with_payload(content))
}

impl TryFrom<&Block> for BlockEnvelope {
    type Error = EnvelopeError;

    fn try_from(block: &Block) -> Result<Self, Self::Error> {
        to_envelope(block)
    }
}
