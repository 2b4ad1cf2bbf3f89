//! stmtbench - replay statement workloads against stmtcache strategies

mod workload;

use anyhow::Result;
use clap::Parser;
use stmtcache::{CacheConfig, Strategy};
use tracing::info;

use crate::workload::{Report, RunSpec, Workload};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Strategies to compare (comma separated)
    #[arg(short, long, value_delimiter = ',', default_value = "array,list")]
    strategy: Vec<Strategy>,

    /// Cache capacity (number of statements)
    #[arg(short, long, default_value_t = 10000)]
    capacity: usize,

    /// Operations per run
    #[arg(short, long, default_value_t = 100_000)]
    ops: usize,

    /// Access pattern
    #[arg(short, long, value_enum, default_value_t = Workload::Sequential)]
    workload: Workload,

    /// Worker threads sharing one cache
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    threads: u16,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    info!("Starting stmtbench v{}", env!("CARGO_PKG_VERSION"));
    info!("Cache capacity: {}", args.capacity);

    let reports = args
        .strategy
        .iter()
        .map(|&strategy| {
            workload::run(&RunSpec {
                config: CacheConfig::new(args.capacity).with_strategy(strategy),
                workload: args.workload,
                ops: args.ops,
                threads: usize::from(args.threads),
            })
        })
        .collect::<Result<Vec<Report>>>()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            println!("{}", report.summary());
        }
    }

    Ok(())
}
