//! Deterministic simulator for a four-level multilevel feedback queue:
//! round robin (Q1), round robin with a longer quantum (Q2), shortest
//! remaining time first (Q3), and first come first served (Q4).
//!
//! [`Simulator::new`] takes a workload and a [`SchedulerConfig`] and
//! [`Simulator::run`] drives it to completion (or to the safety bound),
//! producing a [`SimulationReport`]: a Gantt trace, a scheduling event
//! log, per-process timing, and aggregate utilization/waiting-time
//! metrics.

mod engine;
mod metrics;
mod predictor;
mod process;
mod queue;
mod scheduler;
mod sim;
mod trace;
mod workload;

pub use metrics::{compute as compute_metrics, Metrics};
pub use predictor::predicted_cpu_bursts;
pub use process::{Process, ProcessState, NONE_TIME};
pub use sim::{
    ProcessBursts, ProcessReport, SchedulerConfig, Simulator, SimulationReport, DEFAULT_MAX_TIME,
};
pub use trace::{Algo, GanttSegment};
pub use workload::{parse_workload, WorkloadError};
