//! Aggregate metrics, derived from final simulator state.

use crate::process::Process;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub cpu_utilization: f64,
    pub avg_waiting_time: f64,
}

pub fn compute(current_time: u64, free_cpu_time: u64, processes: &HashMap<u32, Process>) -> Metrics {
    let cpu_utilization = if current_time > 0 {
        round1(100.0 * (current_time - free_cpu_time) as f64 / current_time as f64)
    } else {
        0.0
    };

    let n = processes.len();
    let avg_waiting_time = if n > 0 {
        let total: i64 = processes.values().map(|p| p.waiting_time()).sum();
        round1(total as f64 / n as f64)
    } else {
        0.0
    };

    Metrics { cpu_utilization, avg_waiting_time }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
