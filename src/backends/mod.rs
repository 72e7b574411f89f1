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

//! Backend adapter layer.
//!
//! The benchmark driver consumes the [`VectorBackend`] trait only;
//! one implementation exists per backend kind and [`connect`] routes
//! to it. Connections are opened lazily on first use; `close`
//! consumes the handle so a double close cannot compile.

use async_trait::async_trait;
use url::Url;

use crate::core::{
    BackendError, BackendKind, BenchConfig, BenchError, BenchResult, SearchHit, Vector,
    VectorRecord,
};

pub mod clickhouse;
pub mod qdrant;
pub mod weaviate;

pub use clickhouse::ClickHouseBackend;
pub use qdrant::QdrantBackend;
pub use weaviate::WeaviateBackend;

/// The capability set the driver needs from a vector store.
///
/// Implementations never retry internally; every failure propagates
/// to the caller. A single handle is shared read-only across all
/// concurrent queries of a batch, so implementations must be
/// `Send + Sync` and pool connections themselves (reqwest does).
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Idempotently provision the schema/collection. Must not error
    /// when it already exists; `drop` destroys it first.
    async fn init(&self, drop: bool) -> Result<(), BackendError>;

    /// Persist one batch. Order within the batch is unspecified, but
    /// every record must be visible to searches issued after this
    /// call completes, modulo the backend's own indexing lag.
    async fn insert(&self, records: Vec<VectorRecord>) -> Result<(), BackendError>;

    /// Top-K nearest records by the backend's native metric,
    /// excluding logically deleted records where applicable.
    async fn search(&self, vector: Vector) -> Result<Vec<SearchHit>, BackendError>;

    /// Release the handle's resources.
    async fn close(self: Box<Self>);
}

/// Resolve the backend selection flags to exactly one kind; zero or
/// more than one selected is a configuration error, caught before any
/// connection is attempted.
pub fn select_kind(clickhouse: bool, qdrant: bool, weaviate: bool) -> BenchResult<BackendKind> {
    match (clickhouse, qdrant, weaviate) {
        (true, false, false) => Ok(BackendKind::ClickHouse),
        (false, true, false) => Ok(BackendKind::Qdrant),
        (false, false, true) => Ok(BackendKind::Weaviate),
        (false, false, false) => Err(BenchError::Config(
            "no backend selected: pass one of --clickhouse, --qdrant, --weaviate".to_string(),
        )),
        _ => Err(BenchError::Config(
            "more than one backend selected: pass exactly one of --clickhouse, --qdrant, --weaviate"
                .to_string(),
        )),
    }
}

/// Build the adapter for `kind` against `endpoint`/`database`. The
/// URL is validated here; no network traffic happens until the first
/// operation.
pub fn connect(
    kind: BackendKind,
    endpoint: &str,
    database: &str,
    config: &BenchConfig,
) -> BenchResult<Box<dyn VectorBackend>> {
    let endpoint = Url::parse(endpoint)
        .map_err(|e| BenchError::Config(format!("invalid endpoint url {endpoint:?}: {e}")))?;

    Ok(match kind {
        BackendKind::ClickHouse => Box::new(ClickHouseBackend::new(endpoint, database, config)?),
        BackendKind::Qdrant => Box::new(QdrantBackend::new(endpoint, database, config)?),
        BackendKind::Weaviate => Box::new(WeaviateBackend::new(endpoint, database, config)?),
    })
}

/// Map a non-2xx response to `BackendError::Api` with the body text
/// as the message.
pub(crate) async fn expect_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(BackendError::Api {
        status: status.as_u16(),
        message,
    })
}
