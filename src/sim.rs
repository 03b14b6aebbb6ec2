//! The simulator's owned state and the public report shape. The scheduling
//! behaviour itself lives in [`crate::engine`] and [`crate::scheduler`],
//! each contributing `impl Simulator` blocks.

use crate::process::Process;
use crate::queue::{QueueSet, QueueTag};
use crate::trace::{EventLog, GanttSegment};
use std::collections::HashMap;

/// Safety bound on simulated ticks. A backstop, not a feature.
pub const DEFAULT_MAX_TIME: u64 = 20_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    pub q1: u64,
    pub q2: u64,
    pub alpha: f64,
    pub max_time: u64,
}

impl SchedulerConfig {
    pub fn new(q1: u64, q2: u64, alpha: f64) -> Self {
        Self { q1, q2, alpha, max_time: DEFAULT_MAX_TIME }
    }

    pub fn with_max_time(mut self, max_time: u64) -> Self {
        self.max_time = max_time;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessReport {
    pub pid: u32,
    pub arrival_time: u64,
    pub start_time: i64,
    pub complete_time: i64,
    pub waiting_time: i64,
    pub turnaround_time: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessBursts {
    pub pid: u32,
    pub cpu_bursts: Vec<u64>,
    pub io_bursts: Vec<u64>,
}

#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub gantt: Vec<GanttSegment>,
    pub events: Vec<String>,
    pub processes: Vec<ProcessReport>,
    pub original_bursts: Vec<ProcessBursts>,
    pub cpu_utilization: f64,
    pub avg_waiting_time: f64,
    pub current_time: u64,
    pub free_cpu_time: u64,
    pub hit_safety_cap: bool,
}

pub struct Simulator {
    pub(crate) config: SchedulerConfig,
    pub(crate) current_time: u64,
    pub(crate) free_cpu_time: u64,
    pub(crate) processes: HashMap<u32, Process>,
    pub(crate) original_bursts: HashMap<u32, (Vec<u64>, Vec<u64>)>,
    pub(crate) queues: QueueSet,
    pub(crate) recent_queue: HashMap<u32, QueueTag>,
    pub(crate) rr1_total: HashMap<u32, u64>,
    pub(crate) rr2_total: HashMap<u32, u64>,
    pub(crate) rr2_elapsed: HashMap<u32, u64>,
    pub(crate) stage_start_time: HashMap<u32, u64>,
    pub(crate) gantt: Vec<GanttSegment>,
    pub(crate) events: EventLog,
    pub(crate) prev_srtf: Option<u32>,
    pub(crate) hit_safety_cap: bool,
}

impl Simulator {
    pub fn new(processes: Vec<Process>, config: SchedulerConfig) -> Self {
        let mut by_pid = HashMap::with_capacity(processes.len());
        let mut original_bursts = HashMap::with_capacity(processes.len());
        for p in processes {
            original_bursts.insert(p.pid, (p.cpu_bursts.clone(), p.io_bursts.clone()));
            by_pid.insert(p.pid, p);
        }
        Self {
            config,
            current_time: 0,
            free_cpu_time: 0,
            processes: by_pid,
            original_bursts,
            queues: QueueSet::new(),
            recent_queue: HashMap::new(),
            rr1_total: HashMap::new(),
            rr2_total: HashMap::new(),
            rr2_elapsed: HashMap::new(),
            stage_start_time: HashMap::new(),
            gantt: Vec::new(),
            events: EventLog::default(),
            prev_srtf: None,
            hit_safety_cap: false,
        }
    }

    pub fn current_time(&self) -> u64 {
        self.current_time
    }

    pub fn free_cpu_time(&self) -> u64 {
        self.free_cpu_time
    }

    pub fn hit_safety_cap(&self) -> bool {
        self.hit_safety_cap
    }

    pub(crate) fn emit(&mut self, pid: u32, start_tick: u64, end_tick: u64, algo: crate::trace::Algo) {
        self.gantt.push(GanttSegment { pid, start_tick, end_tick, algo });
    }

    pub(crate) fn log(&mut self, line: String) {
        self.events.push(line);
    }
}
