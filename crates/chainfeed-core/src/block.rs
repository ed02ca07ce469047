//! The block record emitted by node instrumentation.
//!
//! The canonical binary form is protobuf. Field tags are part of the wire
//! contract with the instrumented node and must never be renumbered.

use chrono::{DateTime, Utc};
use prost::Message;

/// A decoded block.
#[derive(Clone, PartialEq, Message)]
pub struct Block {
    /// Independent hash of the block; the block id.
    #[prost(bytes = "vec", tag = "1")]
    pub indep_hash: Vec<u8>,
    /// Independent hash of the parent block.
    #[prost(bytes = "vec", tag = "2")]
    pub previous_block: Vec<u8>,
    #[prost(uint64, tag = "3")]
    pub height: u64,
    /// Unix timestamp (seconds, UTC).
    #[prost(uint64, tag = "4")]
    pub timestamp: u64,
    #[prost(bytes = "vec", tag = "5")]
    pub nonce: Vec<u8>,
    #[prost(bytes = "vec", tag = "6")]
    pub hash: Vec<u8>,
    #[prost(bytes = "vec", tag = "7")]
    pub tx_root: Vec<u8>,
    #[prost(bytes = "vec", tag = "8")]
    pub reward_addr: Vec<u8>,
    #[prost(message, repeated, tag = "9")]
    pub txs: Vec<Transaction>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Transaction {
    #[prost(uint32, tag = "1")]
    pub format: u32,
    #[prost(bytes = "vec", tag = "2")]
    pub id: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub last_tx: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub owner: Vec<u8>,
    #[prost(message, repeated, tag = "5")]
    pub tags: Vec<Tag>,
    #[prost(bytes = "vec", tag = "6")]
    pub target: Vec<u8>,
    /// Big-endian unsigned amount.
    #[prost(bytes = "vec", tag = "7")]
    pub quantity: Vec<u8>,
    #[prost(bytes = "vec", tag = "8")]
    pub data: Vec<u8>,
    #[prost(uint64, tag = "9")]
    pub data_size: u64,
    #[prost(bytes = "vec", tag = "10")]
    pub data_root: Vec<u8>,
    #[prost(bytes = "vec", tag = "11")]
    pub signature: Vec<u8>,
    /// Big-endian unsigned fee.
    #[prost(bytes = "vec", tag = "12")]
    pub reward: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Tag {
    #[prost(bytes = "vec", tag = "1")]
    pub name: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
}

impl Block {
    /// Deserialize a block from its canonical protobuf bytes.
    pub fn from_canonical_bytes(bytes: &[u8]) -> Result<Self, prost::DecodeError> {
        Self::decode(bytes)
    }

    /// Serialize the block to its canonical protobuf bytes.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    /// Hex-encoded block id.
    pub fn id(&self) -> String {
        hex::encode(&self.indep_hash)
    }

    pub fn number(&self) -> u64 {
        self.height
    }

    /// Hex-encoded id of the parent block (empty for genesis).
    pub fn previous_id(&self) -> String {
        hex::encode(&self.previous_block)
    }

    /// Block time. Timestamps outside chrono's range map to the Unix epoch.
    pub fn time(&self) -> DateTime<Utc> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_default()
    }

    pub fn transaction_count(&self) -> usize {
        self.txs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Block {
        Block {
            indep_hash: vec![0xde, 0xad, 0xbe, 0xef],
            previous_block: vec![0xca, 0xfe],
            height: 1_024,
            timestamp: 1_700_000_000,
            txs: vec![Transaction {
                id: vec![1, 2, 3],
                tags: vec![Tag {
                    name: b"Content-Type".to_vec(),
                    value: b"text/plain".to_vec(),
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn identity_accessors() {
        let b = sample();
        assert_eq!(b.id(), "deadbeef");
        assert_eq!(b.previous_id(), "cafe");
        assert_eq!(b.number(), 1_024);
        assert_eq!(b.time().timestamp(), 1_700_000_000);
        assert_eq!(b.transaction_count(), 1);
    }

    #[test]
    fn minimal_payload_decodes() {
        // field 1 (indep_hash), length 2, bytes 08 c8
        let bytes = hex::decode("0a0208c8").unwrap();
        let b = Block::from_canonical_bytes(&bytes).unwrap();
        assert_eq!(b.indep_hash, vec![0x08, 0xc8]);
        assert_eq!(b.height, 0);
        assert!(b.txs.is_empty());
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let bytes = hex::decode("0a02").unwrap();
        assert!(Block::from_canonical_bytes(&bytes).is_err());
    }

    #[test]
    fn out_of_range_timestamp_maps_to_epoch() {
        let b = Block {
            timestamp: u64::MAX,
            ..Default::default()
        };
        assert_eq!(b.time().timestamp(), 0);
    }
}
