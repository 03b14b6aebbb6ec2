//! Workload file adapter. Parses the tab-separated text format into
//! [`Process`] records. Malformed input is rejected here; it never reaches
//! the simulator core.

use crate::process::Process;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum WorkloadError {
    #[error("line {line}: expected pid, arrival_time and at least one CPU burst, got {got} field(s)")]
    TooFewFields { line: usize, got: usize },
    #[error("line {line}: field {field} is not a non-negative integer: {value:?}")]
    InvalidInteger { line: usize, field: String, value: String },
    #[error("line {line}: burst list has an even number of fields; it must start and end on a CPU burst")]
    EvenBurstCount { line: usize },
    #[error("line {line}: duplicate pid {pid}")]
    DuplicatePid { line: usize, pid: u32 },
}

/// Parses one process per non-empty, non-`#`-prefixed line of tab-separated
/// `pid, arrival_time, cpu, io, cpu, io, ..., cpu` fields. The returned
/// processes are sorted by arrival time, ties broken by pid, matching the
/// admission order the scheduler itself uses for same-tick arrivals.
pub fn parse_workload(text: &str) -> Result<Vec<Process>, WorkloadError> {
    let mut processes = Vec::new();
    let mut seen_pids = HashSet::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(WorkloadError::TooFewFields { line: line_no, got: fields.len() });
        }

        let pid = parse_field(line_no, "pid", fields[0])?;
        let arrival_time = parse_field(line_no, "arrival_time", fields[1])?;

        let burst_fields = &fields[2..];
        if burst_fields.len() % 2 == 0 {
            return Err(WorkloadError::EvenBurstCount { line: line_no });
        }

        let mut cpu_bursts = Vec::with_capacity(burst_fields.len() / 2 + 1);
        let mut io_bursts = Vec::with_capacity(burst_fields.len() / 2);
        for (i, raw) in burst_fields.iter().enumerate() {
            let value: u64 = parse_field(line_no, "burst", raw)?;
            if i % 2 == 0 {
                cpu_bursts.push(value);
            } else {
                io_bursts.push(value);
            }
        }

        if !seen_pids.insert(pid) {
            return Err(WorkloadError::DuplicatePid { line: line_no, pid });
        }

        processes.push(Process::new(pid, arrival_time, cpu_bursts, io_bursts));
    }

    processes.sort_by_key(|p| (p.arrival_time, p.pid));
    Ok(processes)
}

fn parse_field<T: std::str::FromStr>(line: usize, field: &str, raw: &str) -> Result<T, WorkloadError> {
    raw.parse().map_err(|_| WorkloadError::InvalidInteger {
        line,
        field: field.to_string(),
        value: raw.to_string(),
    })
}
