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

//! Qdrant adapter over the REST API.
//!
//! Collections are provisioned with the same profile the harness has
//! always benchmarked against: cosine distance, HNSW graph on disk,
//! int8 scalar quantization held in RAM, payload on disk. Searches
//! oversample the quantized candidates and rescore with originals.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use super::{expect_success, VectorBackend};
use crate::core::{BackendError, BenchConfig, BenchResult, SearchHit, Vector, VectorRecord};

const HNSW_EF: usize = 256;
const MEMMAP_THRESHOLD: usize = 100_000;
const QUANTIZATION_OVERSAMPLING: f32 = 2.0;

pub struct QdrantBackend {
    http: reqwest::Client,
    endpoint: Url,
    collection: String,
    dimension: usize,
    top_k: usize,
}

#[derive(Serialize)]
struct PointsList<'a> {
    points: Vec<Point<'a>>,
}

#[derive(Serialize)]
struct Point<'a> {
    id: Uuid,
    vector: &'a [f32],
    payload: Payload,
}

#[derive(Serialize)]
struct Payload {
    create_time: f64,
    update_time: f64,
    is_deleted: u8,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_vector: bool,
    with_payload: bool,
    params: SearchParams,
}

#[derive(Serialize)]
struct SearchParams {
    hnsw_ef: usize,
    quantization: QuantizationSearchParams,
}

#[derive(Serialize)]
struct QuantizationSearchParams {
    oversampling: f32,
    rescore: bool,
    ignore: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    id: Uuid,
    score: f32,
}

fn epoch_seconds(t: DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64 / 1000.0
}

impl QdrantBackend {
    pub fn new(endpoint: Url, collection: &str, config: &BenchConfig) -> BenchResult<Self> {
        let http = reqwest::Client::new();
        Ok(Self {
            http,
            endpoint,
            collection: collection.to_string(),
            dimension: config.dimension,
            top_k: config.top_k,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.as_str().trim_end_matches('/'), path)
    }

    fn collection_url(&self) -> String {
        self.url(&format!("collections/{}", self.collection))
    }

    /// True when the collection already exists; 404 means absent, any
    /// other failure propagates.
    async fn collection_exists(&self) -> Result<bool, BackendError> {
        let response = self.http.get(self.collection_url()).send().await?;
        if response.status().as_u16() == 404 {
            return Ok(false);
        }
        expect_success(response).await?;
        Ok(true)
    }

    async fn create_collection(&self) -> Result<(), BackendError> {
        info!("creating collection {}", self.collection);
        let body = json!({
            "vectors": {
                "size": self.dimension,
                "distance": "Cosine",
            },
            "hnsw_config": {
                "on_disk": true,
            },
            "optimizers_config": {
                "memmap_threshold": MEMMAP_THRESHOLD,
            },
            "quantization_config": {
                "scalar": {
                    "type": "int8",
                    "always_ram": true,
                },
            },
            "on_disk_payload": true,
        });
        let response = self
            .http
            .put(self.collection_url())
            .json(&body)
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl VectorBackend for QdrantBackend {
    async fn init(&self, drop: bool) -> Result<(), BackendError> {
        if drop {
            let response = self.http.delete(self.collection_url()).send().await?;
            if response.status().as_u16() != 404 {
                expect_success(response).await?;
            }
        }
        if self.collection_exists().await? {
            info!(
                "collection {} already exists, skipping create",
                self.collection
            );
            return Ok(());
        }
        self.create_collection().await
    }

    async fn insert(&self, records: Vec<VectorRecord>) -> Result<(), BackendError> {
        let points = PointsList {
            points: records
                .iter()
                .map(|record| Point {
                    id: record.id,
                    vector: &record.vector,
                    payload: Payload {
                        create_time: epoch_seconds(record.create_time),
                        update_time: epoch_seconds(record.update_time),
                        is_deleted: record.is_deleted as u8,
                    },
                })
                .collect(),
        };
        let response = self
            .http
            .put(self.url(&format!("collections/{}/points", self.collection)))
            .json(&points)
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    async fn search(&self, vector: Vector) -> Result<Vec<SearchHit>, BackendError> {
        let request = SearchRequest {
            vector: &vector,
            limit: self.top_k,
            with_vector: false,
            with_payload: true,
            params: SearchParams {
                hnsw_ef: HNSW_EF,
                quantization: QuantizationSearchParams {
                    oversampling: QUANTIZATION_OVERSAMPLING,
                    rescore: true,
                    ignore: false,
                },
            },
        };
        let response = self
            .http
            .post(self.url(&format!("collections/{}/points/search", self.collection)))
            .json(&request)
            .send()
            .await?;
        let parsed: SearchResponse = expect_success(response).await?.json().await?;
        Ok(parsed
            .result
            .into_iter()
            .map(|point| SearchHit {
                id: point.id,
                score: point.score,
            })
            .collect())
    }

    async fn close(self: Box<Self>) {
        debug!("closing qdrant handle for {}", self.endpoint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BenchConfig;

    fn backend() -> QdrantBackend {
        QdrantBackend::new(
            Url::parse("http://127.0.0.1:6333").unwrap(),
            "test",
            &BenchConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_urls_are_rooted_at_the_endpoint() {
        let backend = backend();
        assert_eq!(
            backend.collection_url(),
            "http://127.0.0.1:6333/collections/test"
        );
        assert_eq!(
            backend.url("collections/test/points/search"),
            "http://127.0.0.1:6333/collections/test/points/search"
        );
    }

    #[test]
    fn test_search_request_shape() {
        let vector = vec![0.1_f32, 0.2];
        let request = SearchRequest {
            vector: &vector,
            limit: 5,
            with_vector: false,
            with_payload: true,
            params: SearchParams {
                hnsw_ef: HNSW_EF,
                quantization: QuantizationSearchParams {
                    oversampling: QUANTIZATION_OVERSAMPLING,
                    rescore: true,
                    ignore: false,
                },
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["limit"], 5);
        assert_eq!(value["with_vector"], false);
        assert_eq!(value["params"]["hnsw_ef"], 256);
        assert_eq!(value["params"]["quantization"]["rescore"], true);
    }

    #[test]
    fn test_search_response_parses_scored_points() {
        let raw = r#"{
            "result": [
                {"id": "67e55044-10b1-426f-9247-bb680e5fe0c8", "score": 0.92, "version": 3}
            ],
            "status": "ok",
            "time": 0.002
        }"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.result.len(), 1);
        assert!((parsed.result[0].score - 0.92).abs() < f32::EPSILON);
    }

    #[test]
    fn test_epoch_seconds_keeps_millis() {
        let t = DateTime::from_timestamp_millis(946_728_000_500).unwrap();
        assert!((epoch_seconds(t) - 946_728_000.5).abs() < 1e-6);
    }
}
