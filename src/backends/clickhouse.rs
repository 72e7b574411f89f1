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

//! ClickHouse adapter over the HTTP interface.
//!
//! Vectors live in an `Array(Float32)` column and search is a
//! brute-force `L2Distance` scan, so this backend measures columnar
//! scan throughput rather than ANN index performance. The table is
//! partitioned by `toYYYYMM(create_time)`, which is what the loader's
//! monthly partition cursor exercises.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use super::{expect_success, VectorBackend};
use crate::core::{BackendError, BenchConfig, BenchResult, SearchHit, Vector, VectorRecord};

const USER: &str = "default";
const PASSWORD: &str = "";
const DEFAULT_DATABASE: &str = "default";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(100);

const TABLE_SQL: &str = "\
CREATE TABLE IF NOT EXISTS tbl
(
    `uuid` String,
    `text_vector` Array(Float32) CODEC(Delta, ZSTD),
    `create_time` DateTime64 DEFAULT now64(),
    `update_time` DateTime64 DEFAULT now64(),
    `is_deleted` UInt8 DEFAULT 0
)
    ENGINE = ReplacingMergeTree(update_time, is_deleted)
    PARTITION BY toYYYYMM(create_time)
    ORDER BY (uuid)
    SETTINGS index_granularity=64";

pub struct ClickHouseBackend {
    http: reqwest::Client,
    endpoint: Url,
    database: String,
    top_k: usize,
}

#[derive(Serialize)]
struct InsertRow<'a> {
    uuid: Uuid,
    text_vector: &'a [f32],
    create_time: String,
    update_time: String,
    is_deleted: u8,
}

#[derive(Deserialize)]
struct SelectResponse {
    data: Vec<HitRow>,
}

#[derive(Deserialize)]
struct HitRow {
    uuid: Uuid,
    score: f32,
}

impl ClickHouseBackend {
    pub fn new(endpoint: Url, database: &str, config: &BenchConfig) -> BenchResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(BackendError::from)?;
        Ok(Self {
            http,
            endpoint,
            database: database.to_string(),
            top_k: config.top_k,
        })
    }

    /// Run one SQL statement against `database` and discard the body.
    async fn exec(&self, sql: String, database: &str) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .query(&[("database", database), ("user", USER), ("password", PASSWORD)])
            .body(sql)
            .send()
            .await?;
        expect_success(response).await?;
        Ok(())
    }

    /// Run one SELECT with `FORMAT JSON` and parse the result rows.
    async fn fetch(&self, sql: String) -> Result<SelectResponse, BackendError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .query(&[
                ("database", self.database.as_str()),
                ("user", USER),
                ("password", PASSWORD),
            ])
            .body(sql)
            .send()
            .await?;
        Ok(expect_success(response).await?.json().await?)
    }
}

fn format_timestamp(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

#[async_trait]
impl VectorBackend for ClickHouseBackend {
    async fn init(&self, drop: bool) -> Result<(), BackendError> {
        if drop {
            self.exec(
                format!("DROP TABLE IF EXISTS {}.tbl", self.database),
                DEFAULT_DATABASE,
            )
            .await?;
        }
        self.exec(
            format!("CREATE DATABASE IF NOT EXISTS {}", self.database),
            DEFAULT_DATABASE,
        )
        .await?;
        self.exec(TABLE_SQL.to_string(), &self.database).await?;
        info!("database and table created");
        Ok(())
    }

    async fn insert(&self, records: Vec<VectorRecord>) -> Result<(), BackendError> {
        let mut body = String::from(
            "INSERT INTO tbl (uuid, text_vector, create_time, update_time, is_deleted) \
             FORMAT JSONEachRow\n",
        );
        for record in &records {
            let row = InsertRow {
                uuid: record.id,
                text_vector: &record.vector,
                create_time: format_timestamp(record.create_time),
                update_time: format_timestamp(record.update_time),
                is_deleted: record.is_deleted as u8,
            };
            body.push_str(&serde_json::to_string(&row)?);
            body.push('\n');
        }
        self.exec(body, &self.database).await
    }

    async fn search(&self, vector: Vector) -> Result<Vec<SearchHit>, BackendError> {
        let sql = format!(
            "SELECT uuid, L2Distance(text_vector, {vector}) AS score \
             FROM tbl WHERE is_deleted=0 \
             ORDER BY score ASC LIMIT {limit} FORMAT JSON",
            vector = serde_json::to_string(&vector)?,
            limit = self.top_k,
        );
        let response = self.fetch(sql).await?;
        Ok(response
            .data
            .into_iter()
            .map(|row| SearchHit {
                id: row.uuid,
                score: row.score,
            })
            .collect())
    }

    async fn close(self: Box<Self>) {
        // reqwest pools are torn down on drop; nothing to flush.
        debug!("closing clickhouse handle for {}", self.endpoint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_insert_row_serializes_to_jsoneachrow_shape() {
        let row = InsertRow {
            uuid: Uuid::nil(),
            text_vector: &[0.5, 0.5],
            create_time: "2000-01-01 12:00:00.000".to_string(),
            update_time: "2000-01-01 12:00:00.000".to_string(),
            is_deleted: 0,
        };
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"uuid\":\"00000000-0000-0000-0000-000000000000\""));
        assert!(json.contains("\"text_vector\":[0.5,0.5]"));
        assert!(json.contains("\"is_deleted\":0"));
    }

    #[test]
    fn test_timestamp_format_matches_datetime64() {
        let t = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(format_timestamp(t), "2000-01-01 12:00:00.000");
    }

    #[test]
    fn test_select_response_parses_clickhouse_json() {
        let raw = r#"{
            "meta": [{"name": "uuid", "type": "String"}],
            "data": [
                {"uuid": "67e55044-10b1-426f-9247-bb680e5fe0c8", "score": 0.25}
            ],
            "rows": 1
        }"#;
        let parsed: SelectResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data.len(), 1);
        assert!((parsed.data[0].score - 0.25).abs() < f32::EPSILON);
    }
}
