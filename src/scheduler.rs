//! Scheduler core: picks the highest non-empty ready queue each
//! decision and runs that queue's discipline for one step.

use crate::process::ProcessState;
use crate::queue::QueueTag;
use crate::sim::{ProcessBursts, ProcessReport, SimulationReport, Simulator};
use crate::trace::Algo;

impl Simulator {
    /// Runs the simulation to completion (all processes terminated and all
    /// ready queues empty) or until the safety bound is hit, and returns
    /// the final report. A `Simulator` is single-use: call this once.
    pub fn run(&mut self) -> SimulationReport {
        loop {
            self.admit_arrivals();

            let all_terminated = self.processes.values().all(|p| p.is_terminated());
            let queues_empty = self.queues.q1.is_empty()
                && self.queues.q2.is_empty()
                && self.queues.q3_is_empty()
                && self.queues.q4.is_empty();

            if all_terminated && queues_empty {
                break;
            }
            if self.current_time >= self.config.max_time {
                self.hit_safety_cap = true;
                let now = self.current_time;
                let bound = self.config.max_time;
                self.log(format!(
                    "[WARN {now}] simulation stopped at the safety bound of {bound} ticks before all processes terminated"
                ));
                break;
            }

            if !self.queues.q1.is_empty() {
                self.run_rr1();
            } else if !self.queues.q2.is_empty() {
                self.run_rr2();
            } else if !self.queues.q3_is_empty() {
                self.run_srtf();
            } else if !self.queues.q4.is_empty() {
                self.run_fcfs();
            } else {
                self.tick();
                self.free_cpu_time += 1;
            }
        }

        self.build_report()
    }

    /// Stage 1, RR1. Runs one process to exhaustion of its own quantum (or
    /// demotion/block/termination) before any other queue is considered.
    fn run_rr1(&mut self) {
        let pid = self.queues.q1.pop_front().expect("q1 non-empty");
        {
            let p = self.processes.get_mut(&pid).unwrap();
            if p.start_time == crate::process::NONE_TIME {
                p.start_time = self.current_time as i64;
            }
        }
        let seg_start = self.current_time;
        self.log(format!("[RR1 {seg_start}] process {pid} selected to run"));

        loop {
            let burst = self.processes[&pid].current_cpu_burst();
            let total = *self.rr1_total.get(&pid).unwrap_or(&0);

            if burst == 0 {
                self.emit(pid, seg_start, self.current_time, Algo::Rr1);
                self.rr1_total.insert(pid, 0);
                self.finish_burst(pid, QueueTag::Q1, "RR1");
                break;
            } else if total == 10 * self.config.q1 {
                self.emit(pid, seg_start, self.current_time, Algo::Rr1);
                self.rr1_total.insert(pid, 0);
                let now = self.current_time;
                self.processes.get_mut(&pid).unwrap().state = ProcessState::Ready;
                self.queues.q2.push_back(pid);
                self.log(format!(
                    "[RR1 {now}] process {pid} exceeded its RR1 limit, demoted to RR2"
                ));
                break;
            } else if self.current_time == seg_start + self.config.q1 {
                self.emit(pid, seg_start, self.current_time, Algo::Rr1);
                let now = self.current_time;
                self.processes.get_mut(&pid).unwrap().state = ProcessState::Ready;
                self.queues.q1.push_back(pid);
                self.log(format!("[RR1 {now}] process {pid} exhausted its time quantum"));
                break;
            } else {
                *self.processes.get_mut(&pid).unwrap().current_cpu_burst_mut() -= 1;
                self.tick();
                *self.rr1_total.entry(pid).or_insert(0) += 1;
                self.processes.get_mut(&pid).unwrap().state = ProcessState::Running;
            }
        }
    }

    /// Stage 2, RR2. Peeks the head (no dequeue) and consumes exactly one
    /// CPU unit per call; the per-burst local quantum and the cumulative
    /// demotion threshold are tracked independently.
    fn run_rr2(&mut self) {
        let pid = *self.queues.q2.front().expect("q2 non-empty");
        if !self.stage_start_time.contains_key(&pid) {
            self.stage_start_time.insert(pid, self.current_time);
            let now = self.current_time;
            self.log(format!("[RR2 {now}] process {pid} selected to run"));
        }

        {
            let p = self.processes.get_mut(&pid).unwrap();
            p.state = ProcessState::Running;
            *p.current_cpu_burst_mut() -= 1;
        }
        self.tick();
        *self.rr2_total.entry(pid).or_insert(0) += 1;
        *self.rr2_elapsed.entry(pid).or_insert(0) += 1;

        let burst = self.processes[&pid].current_cpu_burst();
        let seg_start = self.stage_start_time[&pid];

        if burst == 0 {
            self.queues.q2.pop_front();
            self.emit(pid, seg_start, self.current_time, Algo::Rr2);
            self.finish_burst(pid, QueueTag::Q2, "RR2");
            self.rr2_total.insert(pid, 0);
            self.rr2_elapsed.insert(pid, 0);
            self.stage_start_time.remove(&pid);
        } else if self.rr2_total[&pid] == 10 * self.config.q2 {
            self.queues.q2.pop_front();
            let remaining = self.processes[&pid].remaining_cpu();
            self.queues.q3_insert(pid, remaining);
            self.emit(pid, seg_start, self.current_time, Algo::Rr2);
            let now = self.current_time;
            self.processes.get_mut(&pid).unwrap().state = ProcessState::Ready;
            self.log(format!(
                "[RR2 {now}] process {pid} exceeded its RR2 limit, demoted to SRTF"
            ));
            self.rr2_total.insert(pid, 0);
            self.rr2_elapsed.insert(pid, 0);
            self.stage_start_time.remove(&pid);
        } else if self.rr2_elapsed[&pid] == self.config.q2 {
            self.queues.q2.pop_front();
            self.queues.q2.push_back(pid);
            self.emit(pid, seg_start, self.current_time, Algo::Rr2);
            let now = self.current_time;
            self.processes.get_mut(&pid).unwrap().state = ProcessState::Ready;
            self.log(format!("[RR2 {now}] process {pid} exhausted its local time quantum"));
            self.rr2_elapsed.insert(pid, 0);
            self.stage_start_time.remove(&pid);
        } else {
            self.processes.get_mut(&pid).unwrap().state = ProcessState::Ready;
        }
    }

    /// Stage 3, SRTF. Entries are keyed by remaining CPU frozen at
    /// insertion time, so "shortest remaining" is only an approximation
    /// relative to already-resident entries; the head can change between
    /// decisions without the running process itself being re-keyed.
    fn run_srtf(&mut self) {
        let pid = self.queues.q3_peek_min().expect("q3 non-empty");
        if !self.stage_start_time.contains_key(&pid) {
            self.stage_start_time.insert(pid, self.current_time);
        }

        if let Some(prev) = self.prev_srtf {
            if prev != pid {
                let count = {
                    let p = self.processes.get_mut(&prev).unwrap();
                    p.preempted_count += 1;
                    p.preempted_count
                };
                if count == 3 {
                    let now = self.current_time;
                    self.log(format!(
                        "[SRTF {now}] process {prev} was preempted 3 times, escaping to FCFS"
                    ));
                    self.queues.q3_remove(prev);
                    self.queues.q4.push_back(prev);
                    self.stage_start_time.remove(&prev);
                    self.prev_srtf = None;
                    return;
                }
            }
        }

        {
            let p = self.processes.get_mut(&pid).unwrap();
            p.state = ProcessState::Running;
        }
        self.prev_srtf = Some(pid);
        let now = self.current_time;
        self.log(format!("[SRTF {now}] process {pid} selected to run"));

        *self.processes.get_mut(&pid).unwrap().current_cpu_burst_mut() -= 1;
        self.tick();

        let burst = self.processes[&pid].current_cpu_burst();
        let seg_start = self.stage_start_time[&pid];

        if burst == 0 {
            self.queues.q3_remove(pid);
            self.prev_srtf = None;
            self.emit(pid, seg_start, self.current_time, Algo::Srtf);
            self.finish_burst(pid, QueueTag::Q3, "SRTF");
            self.stage_start_time.remove(&pid);
        } else {
            self.processes.get_mut(&pid).unwrap().state = ProcessState::Ready;
        }
    }

    /// Stage 4, FCFS. The overflow queue for processes SRTF has given up
    /// on; once here a process simply runs to completion of its burst.
    fn run_fcfs(&mut self) {
        let pid = *self.queues.q4.front().expect("q4 non-empty");
        if !self.stage_start_time.contains_key(&pid) {
            self.stage_start_time.insert(pid, self.current_time);
            let now = self.current_time;
            self.log(format!("[FCFS {now}] process {pid} selected to run"));
        }

        {
            let p = self.processes.get_mut(&pid).unwrap();
            p.state = ProcessState::Running;
            *p.current_cpu_burst_mut() -= 1;
        }
        self.tick();

        let burst = self.processes[&pid].current_cpu_burst();
        let seg_start = self.stage_start_time[&pid];

        if burst == 0 {
            self.queues.q4.pop_front();
            self.emit(pid, seg_start, self.current_time, Algo::Fcfs);
            self.finish_burst(pid, QueueTag::Q4, "FCFS");
            self.stage_start_time.remove(&pid);
        } else {
            self.processes.get_mut(&pid).unwrap().state = ProcessState::Ready;
        }
    }

    /// Shared tail of every stage's "burst just completed" branch: either
    /// terminate the process, or block it and route it to the I/O queue,
    /// remembering which ready queue to return it to.
    fn finish_burst(&mut self, pid: u32, from: QueueTag, stage_tag: &str) {
        let now = self.current_time;
        let last = self.processes[&pid].is_last_cpu_burst();
        if last {
            self.processes.get_mut(&pid).unwrap().terminate(now);
            self.log(format!("[{stage_tag} {now}] process {pid} terminated after completing all CPU bursts"));
        } else {
            let p = self.processes.get_mut(&pid).unwrap();
            p.state = ProcessState::Blocked;
            p.cpu_index += 1;
            self.recent_queue.insert(pid, from);
            self.queues.io.push(pid);
            self.log(format!(
                "[{stage_tag} {now}] process {pid} finished a CPU burst, blocked for I/O"
            ));
        }
    }

    fn build_report(&self) -> SimulationReport {
        let mut processes: Vec<ProcessReport> = self
            .processes
            .values()
            .map(|p| ProcessReport {
                pid: p.pid,
                arrival_time: p.arrival_time,
                start_time: p.start_time,
                complete_time: p.complete_time,
                waiting_time: p.waiting_time(),
                turnaround_time: p.turnaround_time(),
            })
            .collect();
        processes.sort_by_key(|r| r.pid);

        let mut original_bursts: Vec<ProcessBursts> = self
            .original_bursts
            .iter()
            .map(|(&pid, (cpu, io))| ProcessBursts { pid, cpu_bursts: cpu.clone(), io_bursts: io.clone() })
            .collect();
        original_bursts.sort_by_key(|b| b.pid);

        let metrics = crate::metrics::compute(self.current_time, self.free_cpu_time, &self.processes);

        SimulationReport {
            gantt: self.gantt.clone(),
            events: self.events.lines().to_vec(),
            processes,
            original_bursts,
            cpu_utilization: metrics.cpu_utilization,
            avg_waiting_time: metrics.avg_waiting_time,
            current_time: self.current_time,
            free_cpu_time: self.free_cpu_time,
            hit_safety_cap: self.hit_safety_cap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Process;
    use crate::sim::SchedulerConfig;

    fn run(processes: Vec<Process>, q1: u64, q2: u64) -> SimulationReport {
        let mut sim = Simulator::new(processes, SchedulerConfig::new(q1, q2, 0.5));
        sim.run()
    }

    #[test]
    fn s1_single_process_single_burst() {
        let report = run(vec![Process::new(1, 0, vec![5], vec![])], 2, 3);
        assert_eq!(
            report.gantt,
            vec![
                crate::trace::GanttSegment { pid: 1, start_tick: 0, end_tick: 2, algo: Algo::Rr1 },
                crate::trace::GanttSegment { pid: 1, start_tick: 2, end_tick: 4, algo: Algo::Rr1 },
                crate::trace::GanttSegment { pid: 1, start_tick: 4, end_tick: 5, algo: Algo::Rr1 },
            ]
        );
        assert_eq!(report.processes[0].complete_time, 5);
        assert_eq!(report.processes[0].waiting_time, 0);
        assert_eq!(report.cpu_utilization, 100.0);
    }

    #[test]
    fn s2_two_processes_pure_rr1_fairness() {
        let report = run(
            vec![Process::new(1, 0, vec![4], vec![]), Process::new(2, 0, vec![4], vec![])],
            2,
            3,
        );
        let order: Vec<u32> = report.gantt.iter().map(|g| g.pid).collect();
        assert_eq!(order, vec![1, 2, 1, 2]);
        // Per-tick interleave is 1,1,2,2,1,1,2,2; each process takes two
        // quanta of 2 ticks for its 4-tick burst. Process 1's second
        // quantum exhausts its burst exactly on the quantum boundary, so
        // it terminates two ticks ahead of process 2.
        let p1 = report.processes.iter().find(|p| p.pid == 1).unwrap();
        let p2 = report.processes.iter().find(|p| p.pid == 2).unwrap();
        assert_eq!(p1.complete_time, 6);
        assert_eq!(p2.complete_time, 8);
        assert_eq!(p1.waiting_time, 0);
        assert_eq!(p2.waiting_time, 2);
    }

    #[test]
    fn s3_rr1_to_rr2_demotion_after_ten_times_quantum() {
        let report = run(vec![Process::new(1, 0, vec![25], vec![])], 2, 5);
        let rr1_ticks: u64 = report
            .gantt
            .iter()
            .filter(|g| g.algo == Algo::Rr1)
            .map(|g| g.end_tick - g.start_tick)
            .sum();
        assert_eq!(rr1_ticks, 20);
        assert!(report.gantt.iter().any(|g| g.algo == Algo::Rr2));
    }

    #[test]
    fn s4_cpu_io_alternation() {
        let report = run(vec![Process::new(1, 0, vec![3, 3], vec![4])], 3, 3);
        assert_eq!(
            report.gantt,
            vec![
                crate::trace::GanttSegment { pid: 1, start_tick: 0, end_tick: 3, algo: Algo::Rr1 },
                crate::trace::GanttSegment { pid: 1, start_tick: 7, end_tick: 10, algo: Algo::Rr1 },
            ]
        );
        assert_eq!(report.processes[0].complete_time, 10);
    }

    #[test]
    fn s5_srtf_three_strike_escape_moves_to_fcfs() {
        // Q3 is keyed on remaining CPU frozen at insertion, so a batch of
        // processes inserted all at once never reorders itself; the
        // shortest just runs to completion undisturbed. A genuine
        // preemption only happens when a fresh, shorter arrival lands
        // while the current head is still resident. Drive that directly:
        // pid 1 is the long-running victim, and three short jobs each
        // land on top of it in turn, each one bumping its preempted_count
        // before finishing out of the way.
        let mut sim = Simulator::new(
            vec![
                Process::new(1, 0, vec![5], vec![]),
                Process::new(2, 0, vec![1], vec![]),
                Process::new(3, 0, vec![1], vec![]),
                Process::new(4, 0, vec![1], vec![]),
            ],
            SchedulerConfig::new(1, 1, 0.5),
        );
        for pid in [1u32, 2, 3, 4] {
            sim.processes.get_mut(&pid).unwrap().state = ProcessState::Ready;
        }

        sim.queues.q3_insert(1, 5);
        sim.run_srtf(); // pid 1 is the only resident entry, runs one tick

        for short_pid in [2u32, 3, 4] {
            sim.queues.q3_insert(short_pid, 1);
            sim.run_srtf(); // short job displaces pid 1, then runs to completion
            sim.run_srtf(); // pid 1 is sole resident again (unless just evicted)
        }

        let victim = &sim.processes[&1];
        assert_eq!(victim.preempted_count, 3);
        assert!(!sim.queues.q3_remove(1));
        assert!(sim.queues.q4.contains(&1));
    }

    #[test]
    fn s6_mixed_arrivals_interleave_on_rr1() {
        // Admission happens inside tick(), before the stage requeues the
        // process whose quantum just ended; process 2 arrives
        // during process 1's first tick and so is already in Q1 ahead of
        // process 1 by the time process 1 is re-appended. That gives a
        // strict 1,2,1,2 interleave and waiting(2) = 0, one of a few
        // equally valid outcomes a requeue-policy choice can produce.
        let report = run(
            vec![Process::new(1, 0, vec![2], vec![]), Process::new(2, 1, vec![2], vec![])],
            1,
            1,
        );
        let order: Vec<u32> = report.gantt.iter().map(|g| g.pid).collect();
        assert_eq!(order, vec![1, 2, 1, 2]);
        let p2 = report.processes.iter().find(|p| p.pid == 2).unwrap();
        assert_eq!(p2.waiting_time, 0);
    }

    #[test]
    fn conservation_of_work_matches_original_cpu_bursts() {
        let processes = vec![Process::new(1, 0, vec![3, 2, 4], vec![1, 2])];
        let report = run(processes, 2, 4);
        let original: u64 = report.original_bursts[0].cpu_bursts.iter().sum();
        let attributed: u64 = report.gantt.iter().filter(|g| g.pid == 1).map(|g| g.end_tick - g.start_tick).sum();
        assert_eq!(original, attributed);
    }

    #[test]
    fn no_overlapping_gantt_segments() {
        let report = run(
            vec![Process::new(1, 0, vec![6], vec![]), Process::new(2, 0, vec![6], vec![])],
            2,
            3,
        );
        let mut segments = report.gantt.clone();
        segments.sort_by_key(|g| g.start_tick);
        for window in segments.windows(2) {
            assert!(window[0].end_tick <= window[1].start_tick);
        }
    }

    #[test]
    fn idle_accounting_balances_with_total_time() {
        let report = run(vec![Process::new(1, 2, vec![3], vec![])], 2, 3);
        let total_run: u64 = report.gantt.iter().map(|g| g.end_tick - g.start_tick).sum();
        assert_eq!(report.free_cpu_time + total_run, report.current_time);
    }

    #[test]
    fn arrival_is_honored_no_early_segments() {
        let report = run(vec![Process::new(1, 5, vec![3], vec![])], 2, 3);
        assert!(report.gantt.iter().all(|g| g.start_tick >= 5));
    }

    #[test]
    fn determinism_same_input_same_output() {
        let make = || vec![Process::new(1, 0, vec![6], vec![]), Process::new(2, 1, vec![4], vec![])];
        let a = run(make(), 2, 4);
        let b = run(make(), 2, 4);
        assert_eq!(a.gantt, b.gantt);
        assert_eq!(a.events, b.events);
        assert_eq!(a.cpu_utilization, b.cpu_utilization);
        assert_eq!(a.avg_waiting_time, b.avg_waiting_time);
    }

    #[test]
    fn runaway_simulation_stops_at_safety_cap_and_reports_warning() {
        let mut sim = Simulator::new(
            vec![Process::new(1, 0, vec![10], vec![])],
            SchedulerConfig::new(2, 3, 0.5).with_max_time(5),
        );
        let report = sim.run();
        assert!(report.hit_safety_cap);
        assert!(report.events.iter().any(|line| line.contains("safety bound")));
        assert_eq!(report.current_time, 5);
    }
}
