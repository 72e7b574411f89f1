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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Vector = Vec<f32>;
pub type Score = f32;

/// One synthetic embedding record, as persisted by every backend.
///
/// `create_time` carries the partition boundary the record was loaded
/// under; `update_time` is the wall-clock generation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorRecord {
    pub id: Uuid,
    pub vector: Vector,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
    pub is_deleted: bool,
}

/// A single row of a top-K similarity search, normalized out of each
/// backend's native result envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub id: Uuid,
    pub score: Score,
}

/// The backend kinds vectormark can drive. Exactly one is selected
/// per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    ClickHouse,
    Qdrant,
    Weaviate,
}

impl BackendKind {
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            BackendKind::ClickHouse => "http://127.0.0.1:18123",
            BackendKind::Qdrant => "http://127.0.0.1:6333",
            BackendKind::Weaviate => "http://127.0.0.1:8080",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::ClickHouse => "clickhouse",
            BackendKind::Qdrant => "qdrant",
            BackendKind::Weaviate => "weaviate",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
