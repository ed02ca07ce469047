//! Per-block parse context and statistics.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chainfeed_core::{block::Block, error::DecodeError};
use prost::Message;

use crate::tokenizer::CommandKind;

/// Command counts and timing collected while reading one block.
#[derive(Debug, Clone)]
pub struct ParsingStats {
    started_at: Instant,
    block_num: Option<u64>,
    counts: BTreeMap<String, u64>,
}

impl Default for ParsingStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ParsingStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            block_num: None,
            counts: BTreeMap::new(),
        }
    }

    /// Count one occurrence of `key`, case-insensitively.
    pub fn inc(&mut self, key: &str) {
        *self.counts.entry(key.to_lowercase()).or_default() += 1;
    }

    pub fn count(&self, key: &str) -> u64 {
        self.counts.get(&key.to_lowercase()).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    /// Height of the block these stats belong to, once known.
    pub fn block_num(&self) -> Option<u64> {
        self.block_num
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// State for decoding a single block.
///
/// Built fresh for each decode attempt and consumed by it, so nothing from a
/// failed attempt can reach the next block.
#[derive(Debug)]
pub struct ParseContext {
    current_block: Block,
    stats: ParsingStats,
}

impl ParseContext {
    pub fn new(stats: ParsingStats) -> Self {
        Self {
            current_block: Block::default(),
            stats,
        }
    }

    /// Decode a `BLOCK` command.
    ///
    /// Format: `DMLOG BLOCK <HEIGHT> <ENCODED_BLOCK>` where `<ENCODED_BLOCK>`
    /// is the hex of the protobuf block record.
    pub fn block(mut self, params: &[&str]) -> Result<(Block, ParsingStats), DecodeError> {
        validate_chunk(CommandKind::Block, params, 2)?;

        let height = params[0]
            .parse::<u64>()
            .map_err(|source| DecodeError::InvalidHeight {
                token: params[0].to_string(),
                source,
            })?;
        self.current_block.height = height;
        self.stats.block_num = Some(height);

        let bytes = hex::decode(params[1]).map_err(|e| DecodeError::InvalidPayload {
            reason: format!("hex: {e}"),
        })?;
        self.current_block
            .merge(bytes.as_slice())
            .map_err(|e| DecodeError::InvalidPayload {
                reason: format!("protobuf: {e}"),
            })?;

        if self.current_block.height != height {
            return Err(DecodeError::InvalidPayload {
                reason: format!(
                    "payload height {} does not match line height {height}",
                    self.current_block.height
                ),
            });
        }

        Ok((self.current_block, self.stats))
    }
}

fn validate_chunk(command: CommandKind, params: &[&str], count: usize) -> Result<(), DecodeError> {
    if params.len() != count {
        return Err(DecodeError::Arity {
            command: command.name(),
            expected: count,
            actual: params.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainfeed_core::block::Transaction;

    fn decode(params: &[&str]) -> Result<Block, DecodeError> {
        ParseContext::new(ParsingStats::new())
            .block(params)
            .map(|(block, _)| block)
    }

    #[test]
    fn decodes_minimal_block() {
        let (block, stats) = ParseContext::new(ParsingStats::new())
            .block(&["100", "0a0208c8"])
            .unwrap();
        assert_eq!(block.height, 100);
        assert_eq!(block.indep_hash, vec![0x08, 0xc8]);
        assert!(block.txs.is_empty());
        assert_eq!(stats.block_num(), Some(100));
    }

    #[test]
    fn decodes_transactions() {
        let source = Block {
            indep_hash: vec![1; 32],
            previous_block: vec![2; 32],
            height: 55,
            txs: vec![Transaction::default(), Transaction { format: 2, ..Default::default() }],
            ..Default::default()
        };
        let payload = hex::encode(source.to_canonical_bytes());
        let block = decode(&["55", &payload]).unwrap();
        assert_eq!(block, source);
    }

    #[test]
    fn wrong_arity() {
        for params in [&["1"][..], &["1", "00", "extra"][..], &[][..]] {
            match decode(params) {
                Err(DecodeError::Arity { command: "BLOCK", expected: 2, actual }) => {
                    assert_eq!(actual, params.len())
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn invalid_height() {
        for token in ["abc", "-1", "", "18446744073709551616"] {
            match decode(&[token, "0a02"]) {
                Err(DecodeError::InvalidHeight { token: t, .. }) => assert_eq!(t, token),
                other => panic!("{token:?}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn invalid_hex_payload() {
        for payload in ["zz", "0a0", "0x0a02"] {
            assert!(
                matches!(decode(&["1", payload]), Err(DecodeError::InvalidPayload { .. })),
                "{payload}"
            );
        }
    }

    #[test]
    fn corrupt_protobuf_payload() {
        assert!(matches!(
            decode(&["1", "0a02"]),
            Err(DecodeError::InvalidPayload { .. })
        ));
    }

    #[test]
    fn payload_height_must_match_line() {
        let payload = hex::encode(
            Block {
                height: 7,
                ..Default::default()
            }
            .to_canonical_bytes(),
        );
        assert!(matches!(
            decode(&["8", &payload]),
            Err(DecodeError::InvalidPayload { .. })
        ));
        assert_eq!(decode(&["7", &payload]).unwrap().height, 7);
    }

    #[test]
    fn stats_are_case_insensitive() {
        let mut stats = ParsingStats::new();
        stats.inc("BLOCK");
        stats.inc("block");
        stats.inc("TRX_BEGIN");
        assert_eq!(stats.count("Block"), 2);
        assert_eq!(stats.count("trx_begin"), 1);
        assert_eq!(stats.counts().len(), 2);
        assert_eq!(stats.block_num(), None);
    }
}
