//! Replay a CSV command file through the engine and print what happened.
//!
//! ```text
//! replay --input orders.csv --depth 5
//! replay --input orders.csv --config engine.json --capacity 50000
//! ```

use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use lob_kernel::config::MAX_ORDER_CAPACITY;
use lob_kernel::{feed, Engine, EngineConfig, OutputEvent, Side};
use log::{debug, info};

#[derive(Parser, Debug)]
#[command(about = "Replay order commands from a CSV file")]
struct Args {
    /// CSV file with header `action,order_id,side,price,volume`
    #[arg(short, long)]
    input: PathBuf,

    /// JSON engine config; missing fields use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Arena capacity in orders, overriding the config
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_ORDER_CAPACITY as i64))]
    capacity: Option<u32>,

    /// Price levels per side to print at the end
    #[arg(long, default_value_t = 5)]
    depth: usize,

    /// Only print the summary and final book
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn engine_config(&self) -> Result<EngineConfig, lob_kernel::ConfigError> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(capacity) = self.capacity {
            config = EngineConfig {
                index_capacity: config.index_capacity.min(capacity as usize),
                ..EngineConfig::with_capacity(capacity)
            };
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = args.engine_config()?;
    info!("engine config: {:?}", config);

    let commands = feed::read_commands(File::open(&args.input)?)?;
    info!("loaded {} commands from {}", commands.len(), args.input.display());

    let mut engine = Engine::with_config(config);

    let mut trade_count = 0usize;
    let mut traded_volume = 0u64;
    let mut rejected = 0usize;

    for (row, cmd) in commands.into_iter().enumerate() {
        debug!("row {}: {:?}", row + 1, cmd);
        for event in engine.process_command(cmd) {
            match event {
                OutputEvent::Trade(t) => {
                    trade_count += 1;
                    traded_volume += t.volume;
                    if !args.quiet {
                        println!(
                            "TRADE #{} {} {} @ {} (resting {}, incoming {})",
                            t.seq,
                            t.incoming_side,
                            t.volume,
                            t.price,
                            t.resting_order_id,
                            t.incoming_order_id
                        );
                    }
                }
                OutputEvent::Rejected(r) => {
                    rejected += 1;
                    if !args.quiet {
                        println!("REJECT row {} {}: {:?}", row + 1, r.order_id, r.reason);
                    }
                }
                _ => {}
            }
        }
    }

    engine.matcher.audit()?;

    println!("\n=== Summary ===");
    println!("Trades:         {}", trade_count);
    println!("Traded volume:  {}", traded_volume);
    println!("Rejected:       {}", rejected);
    println!("Resting orders: {}", engine.order_count());

    println!("\n=== Book (top {}) ===", args.depth);
    let asks = engine.matcher.depth(Side::Sell, args.depth);
    for (price, volume) in asks.iter().rev() {
        println!("  ASK {:>14} {:>12}", price.to_string(), volume);
    }
    match engine.matcher.spread() {
        Some(spread) => println!("  --- spread {} ---", spread),
        None => println!("  ---"),
    }
    for (price, volume) in engine.matcher.depth(Side::Buy, args.depth) {
        println!("  BID {:>14} {:>12}", price.to_string(), volume);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_must_fit_index_space() {
        let parse = |capacity: &str| {
            Args::try_parse_from(["replay", "--input", "x.csv", "--capacity", capacity])
        };

        assert_eq!(parse("50000").unwrap().capacity, Some(50_000));
        assert!(parse(&MAX_ORDER_CAPACITY.to_string()).is_ok());
        assert!(parse("4294967295").is_err());
        assert!(parse("0").is_err());
    }

    #[test]
    fn test_capacity_flag_overrides_config() {
        let args = Args::try_parse_from(["replay", "-i", "x.csv", "--capacity", "100"]).unwrap();
        let config = args.engine_config().unwrap();
        assert_eq!(config.order_capacity, 100);
        assert_eq!(config.index_capacity, 100);

        let args = Args::try_parse_from(["replay", "-i", "x.csv"]).unwrap();
        assert_eq!(args.engine_config().unwrap(), EngineConfig::default());
    }
}
