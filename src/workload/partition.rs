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

use chrono::{DateTime, TimeZone, Utc};

/// Monotonic monthly partition marker for bulk loads.
///
/// Starts on January 2000 and only ever moves forward, one calendar
/// month per [`advance`](PartitionCursor::advance). The boundary
/// timestamp is noon UTC on the 1st of the month, so every record of a
/// partition lands unambiguously inside its `toYYYYMM` bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionCursor {
    year: i32,
    month: u32,
}

impl PartitionCursor {
    /// Cursor positioned on the fixed epoch partition, January 2000.
    pub fn new() -> Self {
        Self {
            year: 2000,
            month: 1,
        }
    }

    /// Roll forward exactly one calendar month; December wraps into
    /// January of the next year.
    pub fn advance(&mut self) {
        if self.month == 12 {
            self.month = 1;
            self.year += 1;
        } else {
            self.month += 1;
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The partition boundary time records of this partition are
    /// stamped with.
    pub fn boundary(&self) -> DateTime<Utc> {
        // Fixed fields for an in-range year/month; unwrap cannot fire.
        Utc.with_ymd_and_hms(self.year, self.month, 1, 12, 0, 0)
            .single()
            .expect("partition boundary is always a valid timestamp")
    }

    /// Partition label as rendered in load progress, e.g. `2000-03`.
    pub fn label(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }
}

impl Default for PartitionCursor {
    fn default() -> Self {
        Self::new()
    }
}
