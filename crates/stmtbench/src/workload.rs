//! Statement access patterns and the runner that drives them

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use stmtcache::{CacheConfig, PreparedCache, StatementCache, StatsSnapshot, Strategy};
use tracing::{debug, info};

/// Address every statement is cached under
const ADDRESS: &str = "A";

/// Access pattern replayed against a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Workload {
    /// Prefill, then `get` statements 0, 1, 2, ... in order
    Sequential,
    /// Prefill, then `get` statement `capacity % n` for n = 1, 2, ...
    Scattered,
    /// `set` a fresh statement on every op, starting empty
    Insert,
    /// Prefill, then alternate `get` and `set` over twice the capacity
    Mixed,
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.pad(value.get_name()),
            None => Ok(()),
        }
    }
}

impl Workload {
    fn prefills(self) -> bool {
        !matches!(self, Workload::Insert)
    }

    fn apply(self, cache: &PreparedCache<u64>, n: usize, capacity: usize) {
        match self {
            Workload::Sequential => {
                cache.get(ADDRESS, &n.to_string());
            }
            Workload::Scattered => {
                cache.get(ADDRESS, &(capacity % (n + 1)).to_string());
            }
            Workload::Insert => {
                cache.set(ADDRESS, &n.to_string(), n as u64);
            }
            Workload::Mixed => {
                let stmt = (n % (capacity * 2)).to_string();
                if n % 2 == 0 {
                    cache.get(ADDRESS, &stmt);
                } else {
                    cache.set(ADDRESS, &stmt, n as u64);
                }
            }
        }
    }
}

/// Parameters for one run
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub config: CacheConfig,
    pub workload: Workload,
    pub ops: usize,
    pub threads: usize,
}

/// Outcome of one run
#[derive(Debug, Serialize)]
pub struct Report {
    pub strategy: Strategy,
    pub workload: Workload,
    pub capacity: usize,
    pub threads: usize,
    pub ops: usize,
    pub elapsed_ms: f64,
    pub ops_per_sec: f64,
    pub cached: usize,
    pub stats: StatsSnapshot,
}

impl Report {
    /// One-line human summary
    pub fn summary(&self) -> String {
        format!(
            "{:<6} {:<10} capacity={} threads={} ops={} elapsed={:.2}ms rate={:.0} ops/s hit_ratio={:.3} evictions={} cached={}",
            self.strategy,
            self.workload,
            self.capacity,
            self.threads,
            self.ops,
            self.elapsed_ms,
            self.ops_per_sec,
            self.stats.hit_ratio(),
            self.stats.evictions,
            self.cached,
        )
    }
}

/// Build a cache from `spec.config` and replay the workload against it
pub fn run(spec: &RunSpec) -> Result<Report> {
    let capacity = spec.config.capacity;
    let cache = PreparedCache::from_config(&spec.config)
        .with_context(|| format!("Failed to build {} cache", spec.config.strategy))?;

    if spec.workload.prefills() {
        for i in 0..capacity {
            cache.set(ADDRESS, &i.to_string(), i as u64);
        }
        debug!(cached = cache.len(), "prefilled cache");
    }
    cache.stats().reset();

    info!(
        strategy = %spec.config.strategy,
        workload = %spec.workload,
        ops = spec.ops,
        threads = spec.threads,
        "Running workload"
    );

    let elapsed = replay(&cache, spec);

    Ok(Report {
        strategy: cache.strategy(),
        workload: spec.workload,
        capacity,
        threads: spec.threads,
        ops: spec.ops,
        elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        ops_per_sec: spec.ops as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        cached: cache.len(),
        stats: cache.stats().snapshot(),
    })
}

/// Split ops round-robin across threads sharing one cache
fn replay(cache: &PreparedCache<u64>, spec: &RunSpec) -> Duration {
    let threads = spec.threads.max(1);
    let capacity = spec.config.capacity;
    let start = Instant::now();

    thread::scope(|s| {
        for t in 0..threads {
            s.spawn(move || {
                for n in (t..spec.ops).step_by(threads) {
                    spec.workload.apply(cache, n, capacity);
                }
            });
        }
    });

    start.elapsed()
}
