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

//! Concurrent batched query driver.
//!
//! Queries run in chunks of `batch_size`; within a chunk all queries
//! are in flight concurrently, chunks themselves run strictly
//! sequentially. That caps in-flight concurrency at `batch_size`,
//! keeping the offered load explicit instead of a function of the
//! backend client's connection-pool limits.

use std::future::Future;
use std::time::Duration;

use futures::future::try_join_all;
use tokio::time::Instant;
use tracing::info;

use crate::core::{BackendError, BenchError, BenchResult, Vector};
use crate::workload::generator::random_unit_vector;
use crate::workload::stats::RunStats;

/// Issue `count` random-vector queries in concurrent chunks of
/// `batch_size` and aggregate per-query latencies.
///
/// Each query's elapsed time is captured the moment that query
/// resolves, so intra-chunk skew is visible in the percentiles. A
/// chunk that outlives `chunk_timeout` fails the whole run; partial
/// statistics are not reported. The first query error likewise aborts
/// the run.
pub async fn run_queries<F, Fut, R>(
    count: usize,
    batch_size: usize,
    dimension: usize,
    chunk_timeout: Duration,
    query_fn: F,
) -> BenchResult<RunStats>
where
    F: Fn(Vector) -> Fut,
    Fut: Future<Output = Result<R, BackendError>>,
{
    if count == 0 || batch_size == 0 {
        return Err(BenchError::Config(
            "query count and batch size must be positive".to_string(),
        ));
    }

    let run_start = Instant::now();
    let mut samples: Vec<Duration> = Vec::with_capacity(count);
    let mut issued = 0;
    while issued < count {
        let size = batch_size.min(count - issued);
        let chunk = (0..size).map(|_| {
            let vector = random_unit_vector(dimension);
            let query_fn = &query_fn;
            async move {
                let start = Instant::now();
                query_fn(vector).await?;
                Ok::<_, BackendError>(start.elapsed())
            }
        });

        match tokio::time::timeout(chunk_timeout, try_join_all(chunk)).await {
            Ok(timings) => samples.extend(timings?),
            Err(_) => {
                return Err(BenchError::Timeout {
                    elapsed: chunk_timeout,
                })
            }
        }
        issued += size;
        info!("completed {}/{} queries", issued, count);
    }

    Ok(RunStats::compute(&samples, run_start.elapsed()))
}
