//! `chainfeed inspect` — decode one protocol line and pretty-print it.

use anyhow::{bail, Result};
use chainfeed_core::adapter::to_envelope;
use chainfeed_reader::{tokenize, CommandKind, ParseContext, ParsingStats, ReaderConfig};

pub fn run(config: &ReaderConfig, line: &str) -> Result<()> {
    let Some(command) = tokenize(line, &config.prefix)? else {
        bail!("not a protocol line (expected the {:?} tag)", config.prefix);
    };

    match command.kind() {
        Some(CommandKind::Block) => {
            let (block, stats) = ParseContext::new(ParsingStats::new()).block(&command.args)?;
            let env = to_envelope(&block)?;
            println!("✓ Block #{} decoded in {:?}", block.number(), stats.elapsed());
            println!("  Id:           {}", env.id());
            println!("  Previous id:  {}", env.previous_id());
            println!("  Timestamp:    {}", env.timestamp());
            println!("  LIB:          {}", env.lib_num());
            println!("  Transactions: {}", block.transaction_count());
            println!("  Payload:      {} bytes", env.payload.len());
        }
        None => println!("• Unknown command {:?} with {} args (skipped by the reader)", command.name, command.args.len()),
    }
    Ok(())
}
