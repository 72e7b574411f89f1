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

//! # Vectormark - Vector Search Benchmark Harness
//!
//! Vectormark generates synthetic embedding records, bulk-loads them
//! into a vector-search backend under monthly time partitioning, then
//! issues concurrent nearest-neighbor queries and reports latency
//! statistics. A write-then-read consistency probe checks whether a
//! freshly inserted record is immediately searchable.
//!
//! ## Supported Backends
//!
//! - **ClickHouse** via its HTTP interface (brute-force `L2Distance`)
//! - **Qdrant** via its REST API (HNSW, scalar quantization)
//! - **Weaviate** via GraphQL + REST
//!
//! The benchmark driver only depends on the [`backends::VectorBackend`]
//! trait; backends are interchangeable at the CLI level.

pub mod backends;
pub mod core;
pub mod workload;

pub use crate::core::{BackendError, BenchConfig, BenchError, BenchResult};
