//! `chainfeed decode` — stream a console capture through the reader.

use std::sync::Arc;

use anyhow::{Context, Result};
use chainfeed_core::{adapter::to_envelope, block::Block, error::StreamError};
use chainfeed_observability::ReaderMetrics;
use chainfeed_reader::{ConsoleReader, ObserverSet, ReaderConfig, TracingObserver};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::io::AsyncRead;
use tracing::info;

pub struct DecodeOptions {
    pub envelope: bool,
    pub json: bool,
    pub max_blocks: Option<u64>,
    pub keep_going: bool,
}

#[derive(Serialize)]
struct BlockSummary {
    number: u64,
    id: String,
    previous_id: String,
    timestamp: DateTime<Utc>,
    trx_count: usize,
}

impl From<&Block> for BlockSummary {
    fn from(block: &Block) -> Self {
        Self {
            number: block.number(),
            id: block.id(),
            previous_id: block.previous_id(),
            timestamp: block.time(),
            trx_count: block.transaction_count(),
        }
    }
}

pub async fn run(config: &ReaderConfig, input: &str, opts: DecodeOptions) -> Result<()> {
    let source: Box<dyn AsyncRead + Unpin + Send> = if input == "-" {
        Box::new(tokio::io::stdin())
    } else {
        let file = tokio::fs::File::open(input)
            .await
            .with_context(|| format!("opening {input}"))?;
        Box::new(file)
    };

    let observer = ObserverSet::new()
        .with(TracingObserver)
        .with(ReaderMetrics::global());
    let (reader, feeding) = ConsoleReader::spawn(config, source);
    let mut reader = reader.with_observer(Arc::new(observer));

    let mut decoded = 0u64;
    let mut failed = 0u64;
    loop {
        if opts.max_blocks.is_some_and(|max| decoded >= max) {
            reader.close();
            break;
        }
        match reader.next_block().await {
            Ok(Some(block)) => {
                print_block(&block, &opts)?;
                decoded += 1;
            }
            Ok(None) => break,
            Err(e) if opts.keep_going && e.decode_error().is_some() => {
                eprintln!("✗ {e}");
                failed += 1;
            }
            Err(e) => return Err(e).context("decoding console stream"),
        }
    }

    match feeding.await.context("line feeder panicked")? {
        Ok(()) | Err(StreamError::ReaderClosed) => {}
        Err(e) => return Err(e).context("reading input"),
    }

    info!(decoded, failed, "console stream decoded");
    eprintln!("✓ {decoded} blocks decoded, {failed} malformed lines");
    Ok(())
}

fn print_block(block: &Block, opts: &DecodeOptions) -> Result<()> {
    if opts.envelope {
        let env = to_envelope(block)?;
        if opts.json {
            println!("{}", serde_json::to_string(&env)?);
        } else {
            println!(
                "#{} {} prev={} lib={} time={} payload={}B",
                env.number(),
                env.id(),
                env.previous_id(),
                env.lib_num(),
                env.timestamp(),
                env.payload.len()
            );
        }
        return Ok(());
    }

    let summary = BlockSummary::from(block);
    if opts.json {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        println!(
            "#{} {} prev={} time={} trxs={}",
            summary.number, summary.id, summary.previous_id, summary.timestamp, summary.trx_count
        );
    }
    Ok(())
}
