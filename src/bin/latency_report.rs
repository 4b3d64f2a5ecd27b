//! Per-command latency distribution for the matching engine.
//!
//! Runs a seeded place/cancel workload and prints HDR histogram quantiles.

use std::time::{Duration, Instant};

use clap::Parser;
use hdrhistogram::Histogram;
use lob_kernel::config::MAX_ORDER_CAPACITY;
use lob_kernel::{CancelOrder, Command, Engine, OrderId, PlaceOrder, Side};
use log::info;
use rust_decimal::Decimal;

#[derive(Parser, Debug)]
#[command(about = "Measure per-command engine latency")]
struct Args {
    /// Number of commands to time
    #[arg(long, default_value_t = 1_000_000)]
    iterations: u64,

    /// Arena capacity in orders
    #[arg(
        long,
        default_value_t = 100_000,
        value_parser = clap::value_parser!(u32).range(1..=MAX_ORDER_CAPACITY as i64)
    )]
    capacity: u32,

    /// Cancel every Nth order one step after it was placed (0 disables)
    #[arg(long, default_value_t = 3)]
    cancel_every: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    info!("preparing latency run: {:?}", args);

    let mut engine = Engine::new(args.capacity);
    engine.warm_up();

    let mut histogram = Histogram::<u64>::new_with_bounds(1, 100_000, 3)?;
    let mut total_duration = Duration::ZERO;

    println!("Running {} iterations...", args.iterations);

    for order_id in 1..=args.iterations {
        let cmd = if args.cancel_every > 0 && order_id % args.cancel_every == 0 {
            Command::Cancel(CancelOrder {
                order_id: OrderId(order_id - 1),
            })
        } else {
            Command::Place(PlaceOrder {
                order_id: OrderId(order_id),
                side: if order_id % 2 == 0 { Side::Buy } else { Side::Sell },
                price: Decimal::new(10_000 + (order_id % 100) as i64, 2),
                volume: 10,
            })
        };

        let start = Instant::now();
        std::hint::black_box(engine.process_command(cmd));
        let elapsed = start.elapsed();

        // Outliers beyond the histogram bound are dropped
        histogram.record(elapsed.as_nanos() as u64).unwrap_or(());
        total_duration += elapsed;
    }

    info!("resting orders after run: {}", engine.order_count());

    println!("\n=== Latency Report (ns) ===");
    println!("Total Ops:  {}", args.iterations);
    println!(
        "Throughput: {:.2} ops/sec",
        args.iterations as f64 / total_duration.as_secs_f64()
    );
    println!("---------------------------");
    println!("Min:    {:6} ns", histogram.min());
    println!("P50:    {:6} ns", histogram.value_at_quantile(0.50));
    println!("P90:    {:6} ns", histogram.value_at_quantile(0.90));
    println!("P99:    {:6} ns", histogram.value_at_quantile(0.99));
    println!("P99.9:  {:6} ns", histogram.value_at_quantile(0.999));
    println!("P99.99: {:6} ns", histogram.value_at_quantile(0.9999));
    println!("Max:    {:6} ns", histogram.max());
    println!("---------------------------");

    println!("\nDistribution:");
    for v in histogram.iter_log(100, 2.0) {
        let count = v.count_since_last_iteration();
        if count > 0 {
            println!("<= {:6} ns: {:10} count", v.value_iterated_to(), count);
        }
    }

    Ok(())
}
