/*
 * Copyright 2025 Vectormark Contributors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Vectormark CLI - benchmark driver entry point.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vectormark::backends::{self, VectorBackend};
use vectormark::core::{BenchConfig, BenchError, BenchResult};
use vectormark::workload::{run_load, run_probe, run_queries};

#[derive(Parser)]
#[command(name = "vectormark")]
#[command(about = "Load/latency benchmark harness for vector-search backends")]
struct Cli {
    /// Benchmark a ClickHouse backend
    #[arg(long)]
    clickhouse: bool,

    /// Benchmark a Qdrant backend
    #[arg(long)]
    qdrant: bool,

    /// Benchmark a Weaviate backend
    #[arg(long)]
    weaviate: bool,

    /// Backend endpoint URL; defaults to the selected backend's
    /// conventional local port
    #[arg(long)]
    url: Option<String>,

    /// Database/collection name
    #[arg(long)]
    database: Option<String>,

    /// Optional TOML config file (dimension, top_k, query timeout)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Provision the backend schema/collection
    Init {
        /// Destroy an existing schema before creating it
        #[arg(long)]
        drop: bool,
    },
    /// Bulk-load synthetic records under monthly time partitioning
    Load {
        /// Records to generate
        #[arg(long, default_value_t = 1_000_000)]
        count: usize,
        /// Records per insert batch
        #[arg(long, default_value_t = 1_000)]
        batch: usize,
        /// Records per monthly partition
        #[arg(long, default_value_t = 10_000)]
        partition: usize,
    },
    /// Run concurrent query batches and report latency statistics
    Query {
        /// Total queries to issue
        #[arg(long, default_value_t = 10)]
        count: usize,
        /// Queries in flight per batch
        #[arg(long, default_value_t = 1)]
        batch: usize,
    },
    /// Insert one record and check it is immediately searchable
    Index,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Everything that can be rejected without touching the network is
    // rejected here, before a backend handle exists.
    let config = load_config(cli.config.as_deref())?;
    let kind = backends::select_kind(cli.clickhouse, cli.qdrant, cli.weaviate)?;
    let command = normalize(cli.command)?;

    let url = cli
        .url
        .or_else(|| config.url.clone())
        .unwrap_or_else(|| kind.default_endpoint().to_string());
    let database = cli.database.clone().unwrap_or_else(|| config.database.clone());

    let backend = backends::connect(kind, &url, &database, &config)?;
    info!("benchmarking {} at {} (database {})", kind, url, database);

    // The handle is closed on every exit path, error or not, before
    // the command's result propagates.
    let result = run_command(backend.as_ref(), &config, command).await;
    backend.close().await;
    result?;
    Ok(())
}

/// Validate counts and clamp batch/partition sizes to the total, the
/// way the command surface has always behaved.
fn normalize(command: Command) -> BenchResult<Command> {
    match command {
        Command::Load {
            count,
            batch,
            partition,
        } => {
            ensure_positive("count", count)?;
            ensure_positive("batch", batch)?;
            ensure_positive("partition", partition)?;
            Ok(Command::Load {
                count,
                batch: clamp("batch", batch, count),
                partition: clamp("partition", partition, count),
            })
        }
        Command::Query { count, batch } => {
            ensure_positive("count", count)?;
            ensure_positive("batch", batch)?;
            Ok(Command::Query {
                count,
                batch: clamp("batch", batch, count),
            })
        }
        other => Ok(other),
    }
}

fn ensure_positive(name: &str, value: usize) -> BenchResult<()> {
    if value == 0 {
        return Err(BenchError::Config(format!("--{name} must be positive")));
    }
    Ok(())
}

fn clamp(name: &str, value: usize, count: usize) -> usize {
    if value > count {
        warn!("--{} {} exceeds --count {}, clamping", name, value, count);
        count
    } else {
        value
    }
}

fn load_config(path: Option<&Path>) -> BenchResult<BenchConfig> {
    let Some(path) = path else {
        return Ok(BenchConfig::default());
    };
    let raw = std::fs::read_to_string(path).map_err(|e| {
        BenchError::Config(format!("cannot read config file {}: {e}", path.display()))
    })?;
    toml::from_str(&raw).map_err(|e| {
        BenchError::Config(format!("invalid config file {}: {e}", path.display()))
    })
}

async fn run_command(
    backend: &dyn VectorBackend,
    config: &BenchConfig,
    command: Command,
) -> BenchResult<()> {
    match command {
        Command::Init { drop } => {
            backend.init(drop).await?;
            Ok(())
        }
        Command::Load {
            count,
            batch,
            partition,
        } => {
            run_load(count, batch, partition, config.dimension, |records| {
                backend.insert(records)
            })
            .await
        }
        Command::Query { count, batch } => {
            let timeout = Duration::from_secs(config.query.timeout_secs);
            let stats = run_queries(count, batch, config.dimension, timeout, |vector| {
                backend.search(vector)
            })
            .await?;
            println!(
                "query {} times, totally cost {:.3} seconds, qps {:.3}",
                stats.count,
                stats.total.as_secs_f64(),
                stats.qps
            );
            println!("{stats}");
            Ok(())
        }
        Command::Index => {
            let found = run_probe(
                config.dimension,
                |records| backend.insert(records),
                |vector| backend.search(vector),
                |hits| hits.into_iter().map(|hit| hit.id),
            )
            .await?;
            if found {
                println!("found just inserted record in search");
            } else {
                println!("can not find just inserted record in search");
            }
            Ok(())
        }
    }
}
