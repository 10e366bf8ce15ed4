//! Point-in-time resource usage derived from runtime stats counters.
//!
//! Every snapshot is a fresh two-point derivative over the runtime's own
//! previous-sample window. Nothing is smoothed or retained between calls.

use dockhand_common::types::StatsSample;
use serde::{Deserialize, Serialize};

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;

/// Normalized usage figures for one container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// CPU usage as a percentage of host CPU time, never negative.
    #[serde(rename = "cpu")]
    pub cpu_percent: f64,
    /// Memory in use, in megabytes.
    #[serde(rename = "mem_usage")]
    pub mem_usage_mb: f64,
    /// Memory limit, in megabytes.
    #[serde(rename = "mem_limit")]
    pub mem_limit_mb: f64,
}

/// Computes usage figures from a raw sample.
///
/// CPU is `100 * cpuDelta / systemDelta`, or exactly `0.0` when the host
/// counter did not advance. A container counter that went backwards
/// (counter reset) counts as no usage. All figures are rounded to two
/// decimal places.
#[must_use]
pub fn compute(sample: &StatsSample) -> StatsSnapshot {
    StatsSnapshot {
        cpu_percent: round2(cpu_percent(sample)),
        mem_usage_mb: round2(to_megabytes(sample.memory_usage)),
        mem_limit_mb: round2(to_megabytes(sample.memory_limit)),
    }
}

#[allow(clippy::cast_precision_loss)]
fn cpu_percent(sample: &StatsSample) -> f64 {
    let Some(system_delta) = sample.system_cpu.checked_sub(sample.presystem_cpu) else {
        return 0.0;
    };
    if system_delta == 0 {
        return 0.0;
    }
    let cpu_delta = sample.cpu_total.saturating_sub(sample.precpu_total);
    (cpu_delta as f64 / system_delta as f64) * 100.0
}

#[allow(clippy::cast_precision_loss)]
fn to_megabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MEGABYTE
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
