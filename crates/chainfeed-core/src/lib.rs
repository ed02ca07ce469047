//! # chainfeed-core
//!
//! Types shared across all ChainFeed crates: the protobuf block record
//! decoded from node instrumentation, the chain-agnostic block envelope
//! handed to downstream consumers, and the error taxonomy of the decode
//! pipeline.

pub mod adapter;
pub mod block;
pub mod envelope;
pub mod error;

pub use adapter::to_envelope;
pub use block::{Block, Tag, Transaction};
pub use envelope::{BlockEnvelope, EnvelopeHeader, PayloadKind, PAYLOAD_VERSION};
pub use error::{DecodeError, EnvelopeError, ReaderError, StreamError};
