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

//! Synthetic record generation.
//!
//! Vectors are drawn uniformly from the unit hypercube and
//! L2-normalized: cosine/L2 comparisons are scale-invariant, so a unit
//! norm removes vector magnitude as a variable from the results.

use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::core::{Vector, VectorRecord};

/// A random vector with `‖v‖₂ = 1` in the given dimensionality.
///
/// Uses the thread-local RNG; safe to call from concurrent tasks.
pub fn random_unit_vector(dimension: usize) -> Vector {
    let mut rng = rand::thread_rng();
    let mut v: Vector = (0..dimension).map(|_| rng.gen::<f32>()).collect();
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}

/// `count` fresh records stamped with the caller-supplied
/// `create_time` (the current partition boundary). `update_time` is
/// the generation wall clock; records are never born deleted.
pub fn generate_records(
    count: usize,
    dimension: usize,
    create_time: DateTime<Utc>,
) -> Vec<VectorRecord> {
    (0..count)
        .map(|_| VectorRecord {
            id: Uuid::new_v4(),
            vector: random_unit_vector(dimension),
            create_time,
            update_time: Utc::now(),
            is_deleted: false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    proptest! {
        #[test]
        fn test_vectors_are_unit_norm(dimension in 1usize..=2048) {
            let v = random_unit_vector(dimension);
            prop_assert_eq!(v.len(), dimension);
            let norm = v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
            prop_assert!((norm - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_records_have_distinct_ids() {
        let boundary = Utc::now();
        let records = generate_records(100, 8, boundary);
        assert_eq!(records.len(), 100);

        let ids: HashSet<_> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_records_carry_supplied_create_time() {
        let boundary = Utc::now();
        let records = generate_records(3, 8, boundary);
        for record in &records {
            assert_eq!(record.create_time, boundary);
            assert!(!record.is_deleted);
            assert_eq!(record.vector.len(), 8);
        }
    }
}
