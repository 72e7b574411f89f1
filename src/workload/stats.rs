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

//! Latency aggregation over one query run.

use std::fmt;
use std::time::Duration;

/// Read-only summary over the full sequence of per-query timings.
/// All latency fields are in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    pub count: usize,
    pub total: Duration,
    pub qps: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub stddev: f64,
    pub p90: f64,
    pub p99: f64,
}

impl RunStats {
    /// Aggregate a finished run. `total_wall` is the wall time of the
    /// whole run, chunk scheduling included, so `qps` reflects offered
    /// load rather than per-query service time.
    pub fn compute(samples: &[Duration], total_wall: Duration) -> Self {
        let count = samples.len();
        let total_secs = total_wall.as_secs_f64();
        let qps = if total_secs > 0.0 {
            count as f64 / total_secs
        } else {
            0.0
        };

        if count == 0 {
            return Self {
                count,
                total: total_wall,
                qps,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                stddev: 0.0,
                p90: 0.0,
                p99: 0.0,
            };
        }

        let mut secs: Vec<f64> = samples.iter().map(Duration::as_secs_f64).collect();
        secs.sort_by(|a, b| a.total_cmp(b));

        let mean = secs.iter().sum::<f64>() / count as f64;
        let variance = secs.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / count as f64;

        Self {
            count,
            total: total_wall,
            qps,
            min: secs[0],
            max: secs[count - 1],
            mean,
            stddev: variance.sqrt(),
            p90: percentile(&secs, 90.0),
            p99: percentile(&secs, 99.0),
        }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "min: {:.3}s, max: {:.3}s, mean: {:.3}s, std: {:.3}s, p99: {:.3}s, p90: {:.3}s",
            self.min, self.max, self.mean, self.stddev, self.p99, self.p90
        )
    }
}

/// Percentile by linear interpolation between closest ranks over an
/// already-sorted slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = (q / 100.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] * (1.0 - frac) + sorted[upper] * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_basic_aggregates() {
        let samples = vec![ms(10), ms(20), ms(30), ms(40)];
        let stats = RunStats::compute(&samples, Duration::from_secs(1));

        assert_eq!(stats.count, 4);
        assert!((stats.qps - 4.0).abs() < 1e-9);
        assert!((stats.min - 0.010).abs() < 1e-9);
        assert!((stats.max - 0.040).abs() < 1e-9);
        assert!((stats.mean - 0.025).abs() < 1e-9);
        assert!(stats.min <= stats.mean && stats.mean <= stats.max);
    }

    #[test]
    fn test_percentiles_interpolate_between_ranks() {
        // 1..=100 ms; p90 = 90.1 ms, p99 = 99.01 ms under linear
        // interpolation over (n-1) intervals.
        let samples: Vec<Duration> = (1..=100).map(ms).collect();
        let stats = RunStats::compute(&samples, Duration::from_secs(1));

        assert!((stats.p90 - 0.0901).abs() < 1e-9);
        assert!((stats.p99 - 0.09901).abs() < 1e-9);
        assert!(stats.p90 <= stats.p99);
    }

    #[test]
    fn test_single_sample() {
        let stats = RunStats::compute(&[ms(7)], Duration::from_millis(7));
        assert_eq!(stats.count, 1);
        assert!((stats.min - 0.007).abs() < 1e-9);
        assert!((stats.p99 - 0.007).abs() < 1e-9);
        assert!(stats.stddev.abs() < 1e-12);
    }

    #[test]
    fn test_stddev_population() {
        let samples = vec![ms(10), ms(30)];
        let stats = RunStats::compute(&samples, Duration::from_secs(1));
        // population stddev of {0.010, 0.030} is 0.010
        assert!((stats.stddev - 0.010).abs() < 1e-9);
    }

    #[test]
    fn test_display_shape() {
        let stats = RunStats::compute(&[ms(10), ms(20)], Duration::from_secs(1));
        let line = stats.to_string();
        assert!(line.starts_with("min: "));
        assert!(line.contains("p99: "));
        assert!(line.ends_with('s'));
    }
}
