//! Tick engine: advances virtual time by one unit, admits arrivals,
//! and services I/O progress.

use crate::process::ProcessState;
use crate::queue::QueueTag;
use crate::sim::Simulator;

impl Simulator {
    /// Advances time by one unit, then admits arrivals and services I/O,
    /// always in that fixed order.
    pub(crate) fn tick(&mut self) {
        self.current_time += 1;
        self.admit_arrivals();
        self.service_io();
    }

    /// Moves every `New` process whose arrival has come due onto Q1, in
    /// ascending `(arrival_time, pid)` order. Safe to call more than once
    /// per tick; re-checked opportunistically before each scheduling
    /// decision as well as inside `tick()` itself.
    pub(crate) fn admit_arrivals(&mut self) {
        let mut due: Vec<u32> = self
            .processes
            .values()
            .filter(|p| p.state == ProcessState::New && p.arrival_time <= self.current_time)
            .map(|p| p.pid)
            .collect();
        due.sort_by_key(|&pid| (self.processes[&pid].arrival_time, pid));

        for pid in due {
            let p = self.processes.get_mut(&pid).unwrap();
            p.state = ProcessState::NewAdded;
            self.queues.q1.push_back(pid);
        }
    }

    /// Decrements every I/O-waiting process's current I/O burst by one tick.
    /// A process whose burst reaches zero is routed back to its recent
    /// queue: Q3 re-keyed on current remaining CPU, the others FIFO.
    pub(crate) fn service_io(&mut self) {
        let waiting: Vec<u32> = self.queues.io.clone();
        let mut finished = Vec::new();

        for pid in waiting {
            let p = self.processes.get_mut(&pid).unwrap();
            let burst = p.current_io_burst_mut();
            *burst = burst.saturating_sub(1);
            if *p.current_io_burst_mut() == 0 {
                if let Some(recent) = self.recent_queue.get(&pid).copied() {
                    p.state = ProcessState::Ready;
                    p.io_index += 1;
                    finished.push((pid, recent));
                }
            }
        }

        if finished.is_empty() {
            return;
        }

        let finished_pids: Vec<u32> = finished.iter().map(|(pid, _)| *pid).collect();
        self.queues.io.retain(|pid| !finished_pids.contains(pid));

        for (pid, recent) in finished {
            match recent {
                QueueTag::Q1 => self.queues.q1.push_back(pid),
                QueueTag::Q2 => self.queues.q2.push_back(pid),
                QueueTag::Q4 => self.queues.q4.push_back(pid),
                QueueTag::Q3 => {
                    let remaining = self.processes[&pid].remaining_cpu();
                    self.queues.q3_insert(pid, remaining);
                }
            }
            let now = self.current_time;
            self.log(format!("[IO {now}] process {pid} finished I/O, returning to its queue"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Process;
    use crate::sim::SchedulerConfig;

    fn sim_with(processes: Vec<Process>) -> Simulator {
        Simulator::new(processes, SchedulerConfig::new(2, 4, 0.5))
    }

    #[test]
    fn arrivals_at_time_zero_are_admitted_before_first_decision() {
        let mut sim = sim_with(vec![Process::new(1, 0, vec![5], vec![])]);
        sim.admit_arrivals();
        assert_eq!(sim.queues.q1.len(), 1);
        assert_eq!(sim.processes[&1].state, ProcessState::NewAdded);
    }

    #[test]
    fn arrivals_are_ordered_by_time_then_pid() {
        let mut sim = sim_with(vec![
            Process::new(2, 1, vec![1], vec![]),
            Process::new(1, 1, vec![1], vec![]),
            Process::new(3, 0, vec![1], vec![]),
        ]);
        sim.current_time = 1;
        sim.admit_arrivals();
        let order: Vec<u32> = sim.queues.q1.iter().copied().collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn io_completion_routes_back_to_recent_queue() {
        let mut sim = sim_with(vec![Process::new(1, 0, vec![3, 3], vec![2])]);
        sim.recent_queue.insert(1, QueueTag::Q1);
        sim.queues.io.push(1);
        sim.tick();
        assert!(sim.queues.io.contains(&1));
        sim.tick();
        assert!(!sim.queues.io.contains(&1));
        assert!(sim.queues.q1.contains(&1));
        assert_eq!(sim.processes[&1].state, ProcessState::Ready);
    }

    #[test]
    fn io_completion_into_q3_uses_fresh_remaining_cpu_key() {
        let mut sim = sim_with(vec![Process::new(1, 0, vec![3, 10], vec![1])]);
        sim.processes.get_mut(&1).unwrap().cpu_index = 1;
        sim.recent_queue.insert(1, QueueTag::Q3);
        sim.queues.io.push(1);
        sim.tick();
        assert_eq!(sim.queues.q3_peek_min(), Some(1));
    }
}
