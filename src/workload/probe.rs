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

//! Write-then-read consistency probe.
//!
//! Inserts a single record and immediately searches with the record's
//! own vector. Whether the record shows up exercises the backend's
//! write-to-read visibility lag (index build, replication). A smoke
//! test, not a statistical measurement.

use std::future::Future;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::core::{BackendError, BenchResult, Vector, VectorRecord};
use crate::workload::generator::generate_records;

/// Insert one fresh record, search for it, and report whether its id
/// came back. `extract_ids` maps the backend-specific result envelope
/// to the ids it contains.
pub async fn run_probe<I, IF, Q, QF, R, X, Ids>(
    dimension: usize,
    insert_fn: I,
    query_fn: Q,
    extract_ids: X,
) -> BenchResult<bool>
where
    I: FnOnce(Vec<VectorRecord>) -> IF,
    IF: Future<Output = Result<(), BackendError>>,
    Q: FnOnce(Vector) -> QF,
    QF: Future<Output = Result<R, BackendError>>,
    X: FnOnce(R) -> Ids,
    Ids: IntoIterator<Item = Uuid>,
{
    let mut records = generate_records(1, dimension, Utc::now());
    let record = records.remove(0);
    let id = record.id;
    let vector = record.vector.clone();

    insert_fn(vec![record]).await?;
    let result = query_fn(vector).await?;

    let found = extract_ids(result).into_iter().any(|hit| hit == id);
    if found {
        info!("found just inserted id {} in search", id);
    } else {
        info!("could not find just inserted id {} in search", id);
    }
    Ok(found)
}
