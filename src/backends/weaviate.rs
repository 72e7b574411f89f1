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

//! Weaviate adapter: schema and batch writes over REST, search over
//! GraphQL. Weaviate requires class names to start with an uppercase
//! letter, so the configured collection name is capitalized before
//! use.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use super::{expect_success, VectorBackend};
use crate::core::{BackendError, BenchConfig, BenchResult, SearchHit, Vector, VectorRecord};

pub struct WeaviateBackend {
    http: reqwest::Client,
    endpoint: Url,
    class: String,
    top_k: usize,
}

#[derive(Serialize)]
struct BatchObjects<'a> {
    objects: Vec<BatchObject<'a>>,
}

#[derive(Serialize)]
struct BatchObject<'a> {
    class: &'a str,
    id: Uuid,
    vector: &'a [f32],
    properties: Properties,
}

#[derive(Serialize)]
struct Properties {
    create_time: f64,
    update_time: f64,
    is_deleted: bool,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<GraphqlData>,
    errors: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GraphqlData {
    #[serde(rename = "Get")]
    get: HashMap<String, Vec<GraphqlObject>>,
}

#[derive(Deserialize)]
struct GraphqlObject {
    #[serde(rename = "_additional")]
    additional: GraphqlAdditional,
}

#[derive(Deserialize)]
struct GraphqlAdditional {
    id: Uuid,
    distance: f32,
}

fn epoch_seconds(t: DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64 / 1000.0
}

/// `test` -> `Test`; Weaviate rejects lowercase class names.
fn class_name(collection: &str) -> String {
    let mut chars = collection.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

impl WeaviateBackend {
    pub fn new(endpoint: Url, collection: &str, config: &BenchConfig) -> BenchResult<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            class: class_name(collection),
            top_k: config.top_k,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.as_str().trim_end_matches('/'), path)
    }

    fn schema_url(&self) -> String {
        self.url(&format!("v1/schema/{}", self.class))
    }

    async fn class_exists(&self) -> Result<bool, BackendError> {
        let response = self.http.get(self.schema_url()).send().await?;
        if response.status().as_u16() == 404 {
            return Ok(false);
        }
        expect_success(response).await?;
        Ok(true)
    }

    async fn create_class(&self) -> Result<(), BackendError> {
        info!("creating class {}", self.class);
        let body = json!({
            "class": self.class,
            "properties": [
                {"name": "create_time", "dataType": ["number"]},
                {"name": "update_time", "dataType": ["number"]},
                {"name": "is_deleted", "dataType": ["boolean"]},
            ],
            "vectorIndexConfig": {
                "distance": "cosine",
            },
        });
        let response = self
            .http
            .post(self.url("v1/schema"))
            .json(&body)
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    fn near_vector_query(&self, vector: &[f32]) -> Result<String, BackendError> {
        Ok(format!(
            "{{
                Get {{
                    {class} (
                        limit: {limit},
                        nearVector: {{
                            vector: {vector}
                        }}
                    ) {{
                        update_time
                        create_time
                        is_deleted
                        _additional {{
                            distance
                            id
                        }}
                    }}
                }}
            }}",
            class = self.class,
            limit = self.top_k,
            vector = serde_json::to_string(vector)?,
        ))
    }
}

#[async_trait]
impl VectorBackend for WeaviateBackend {
    async fn init(&self, drop: bool) -> Result<(), BackendError> {
        if drop {
            let response = self.http.delete(self.schema_url()).send().await?;
            if response.status().as_u16() != 404 {
                expect_success(response).await?;
            }
        }
        if self.class_exists().await? {
            info!("class {} already exists, skipping create", self.class);
            return Ok(());
        }
        self.create_class().await
    }

    async fn insert(&self, records: Vec<VectorRecord>) -> Result<(), BackendError> {
        let batch = BatchObjects {
            objects: records
                .iter()
                .map(|record| BatchObject {
                    class: &self.class,
                    id: record.id,
                    vector: &record.vector,
                    properties: Properties {
                        create_time: epoch_seconds(record.create_time),
                        update_time: epoch_seconds(record.update_time),
                        is_deleted: record.is_deleted,
                    },
                })
                .collect(),
        };
        let response = self
            .http
            .post(self.url("v1/batch/objects"))
            .json(&batch)
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    async fn search(&self, vector: Vector) -> Result<Vec<SearchHit>, BackendError> {
        let query = self.near_vector_query(&vector)?;
        let response = self
            .http
            .post(self.url("v1/graphql"))
            .json(&json!({ "query": query }))
            .send()
            .await?;
        let parsed: GraphqlResponse = expect_success(response).await?.json().await?;

        if let Some(errors) = parsed.errors {
            return Err(BackendError::InvalidResponse(format!(
                "graphql errors: {errors}"
            )));
        }
        let data = parsed
            .data
            .ok_or_else(|| BackendError::InvalidResponse("missing data envelope".to_string()))?;
        let objects = data.get.get(&self.class).ok_or_else(|| {
            BackendError::InvalidResponse(format!("missing class {} in Get result", self.class))
        })?;

        Ok(objects
            .iter()
            .map(|object| SearchHit {
                id: object.additional.id,
                score: object.additional.distance,
            })
            .collect())
    }

    async fn close(self: Box<Self>) {
        debug!("closing weaviate handle for {}", self.endpoint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BenchConfig;

    fn backend() -> WeaviateBackend {
        WeaviateBackend::new(
            Url::parse("http://127.0.0.1:8080").unwrap(),
            "test",
            &BenchConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_class_name_is_capitalized() {
        assert_eq!(class_name("test"), "Test");
        assert_eq!(class_name("Embeddings"), "Embeddings");
        assert_eq!(class_name(""), "");
    }

    #[test]
    fn test_near_vector_query_embeds_vector_and_limit() {
        let backend = backend();
        let query = backend.near_vector_query(&[0.25, 0.75]).unwrap();
        assert!(query.contains("Test ("));
        assert!(query.contains("limit: 5"));
        assert!(query.contains("vector: [0.25,0.75]"));
        assert!(query.contains("_additional"));
    }

    #[test]
    fn test_graphql_response_parses_hits() {
        let raw = r#"{
            "data": {
                "Get": {
                    "Test": [
                        {
                            "create_time": 946728000.0,
                            "update_time": 946728000.0,
                            "is_deleted": false,
                            "_additional": {
                                "distance": 0.12,
                                "id": "67e55044-10b1-426f-9247-bb680e5fe0c8"
                            }
                        }
                    ]
                }
            }
        }"#;
        let parsed: GraphqlResponse = serde_json::from_str(raw).unwrap();
        let data = parsed.data.unwrap();
        assert_eq!(data.get["Test"].len(), 1);
        assert!((data.get["Test"][0].additional.distance - 0.12).abs() < f32::EPSILON);
    }

    #[test]
    fn test_graphql_errors_are_surfaced() {
        let raw = r#"{"errors": [{"message": "class not found"}]}"#;
        let parsed: GraphqlResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.errors.is_some());
        assert!(parsed.data.is_none());
    }
}
