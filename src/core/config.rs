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

use serde::{Deserialize, Serialize};

/// Tunables shared by every command. Loaded from an optional TOML
/// file and overridden by CLI flags; defaults match the workload the
/// harness was built to reproduce (1536-dim embeddings, top-5 search).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Embedding dimensionality for generated records and queries.
    pub dimension: usize,
    /// Result-set size requested from similarity search.
    pub top_k: usize,
    /// Default backend endpoint; the CLI `--url` flag wins when set.
    pub url: Option<String>,
    /// Default database/collection name.
    pub database: String,
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Deadline for one whole batch of concurrent queries. Elapsing
    /// it fails the run.
    pub timeout_secs: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            dimension: 1536,
            top_k: 5,
            url: None,
            database: "test".to_string(),
            query: QueryConfig::default(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { timeout_secs: 1000 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BenchConfig::default();
        assert_eq!(config.dimension, 1536);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.database, "test");
        assert_eq!(config.query.timeout_secs, 1000);
    }

    #[test]
    fn test_partial_toml_overrides_defaults() {
        let config: BenchConfig = toml::from_str(
            r#"
            dimension = 384

            [query]
            timeout_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.dimension, 384);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.query.timeout_secs, 30);
    }
}
