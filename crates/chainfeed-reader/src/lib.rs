//! # chainfeed-reader
//!
//! Streaming decoder for the instrumentation protocol a node prints on its
//! standard output while executing blocks.
//!
//! ## Architecture
//! ```text
//! LineSource (AsyncRead → lines, bounded line length)
//!       │
//!       ▼
//! LineFeeder ──► bounded mpsc queue
//!                      │
//!                      ▼
//! ConsoleReader::next_block
//!       ├── tokenizer      (tag check, command + args)
//!       ├── ParseContext   (BLOCK <height> <hex protobuf>)
//!       └── ReaderObserver (logging / metrics hook)
//! ```

pub mod config;
pub mod context;
pub mod line_source;
pub mod observer;
pub mod reader;
pub mod tokenizer;

pub use config::ReaderConfig;
pub use context::{ParseContext, ParsingStats};
pub use line_source::LineSource;
pub use observer::{NoopObserver, ObserverSet, ReaderObserver, TracingObserver};
pub use reader::{CloseHandle, ConsoleReader, LineFeeder};
pub use tokenizer::{tokenize, Command, CommandKind};
