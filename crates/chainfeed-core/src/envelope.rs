//! Chain-agnostic block envelope handed to downstream block containers.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::block::Block;
use crate::error::EnvelopeError;

/// Version of the payload contract carried by every envelope.
pub const PAYLOAD_VERSION: i32 = 1;

/// Protocol identifier of the payload, as understood by block containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    #[default]
    Unknown,
    Eos,
    Eth,
    Solana,
    Near,
    Cosmos,
}

impl PayloadKind {
    /// Numeric protocol code used on the container wire.
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::Eos => 1,
            Self::Eth => 2,
            Self::Solana => 3,
            Self::Near => 4,
            Self::Cosmos => 5,
        }
    }
}

/// Identity and finality metadata of an envelope, before a payload is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeHeader {
    pub id: String,
    pub number: u64,
    pub previous_id: String,
    pub timestamp: DateTime<Utc>,
    /// Last irreversible block number.
    pub lib_num: u64,
    pub payload_kind: PayloadKind,
    pub payload_version: i32,
}

impl EnvelopeHeader {
    /// Attach the serialized block, producing the final envelope.
    ///
    /// The buffer is moved in, so a header that is dropped on an error path
    /// never holds a dangling payload.
    pub fn with_payload(self, payload: impl Into<Bytes>) -> BlockEnvelope {
        BlockEnvelope {
            header: self,
            payload: payload.into(),
        }
    }
}

/// A block wrapped for transport: identity metadata plus the opaque
/// canonical serialization of the block record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockEnvelope {
    #[serde(flatten)]
    pub header: EnvelopeHeader,
    #[serde(serialize_with = "serialize_hex")]
    pub payload: Bytes,
}

impl BlockEnvelope {
    pub fn id(&self) -> &str {
        &self.header.id
    }

    pub fn number(&self) -> u64 {
        self.header.number
    }

    pub fn previous_id(&self) -> &str {
        &self.header.previous_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.header.timestamp
    }

    pub fn lib_num(&self) -> u64 {
        self.header.lib_num
    }

    /// Decode the payload back into the block record it was built from.
    pub fn block(&self) -> Result<Block, EnvelopeError> {
        Ok(Block::from_canonical_bytes(&self.payload)?)
    }
}

fn serialize_hex<S: Serializer>(bytes: &Bytes, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}
