//! Queue set: four ready queues with distinct disciplines, plus the
//! I/O wait multiset and the recent-queue routing map.

use std::collections::VecDeque;

/// Which ready queue a process most recently ran on, used to route it
/// back when its I/O burst completes. Stored as a tag rather than a
/// reference to the queue itself, so the routing map can't create an
/// ownership cycle with the queues it points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueTag {
    Q1,
    Q2,
    Q3,
    Q4,
}

#[derive(Debug, Clone, Copy)]
struct Q3Entry {
    pid: u32,
    remaining_cpu: u64,
    seq: u64,
}

pub struct QueueSet {
    pub q1: VecDeque<u32>,
    pub q2: VecDeque<u32>,
    q3: Vec<Q3Entry>,
    pub q4: VecDeque<u32>,
    /// Unordered multiset of pids waiting on I/O.
    pub io: Vec<u32>,
    next_seq: u64,
}

impl QueueSet {
    pub fn new() -> Self {
        Self {
            q1: VecDeque::new(),
            q2: VecDeque::new(),
            q3: Vec::new(),
            q4: VecDeque::new(),
            io: Vec::new(),
            next_seq: 0,
        }
    }

    /// Inserts into Q3 keyed by `remaining_cpu`, captured now. Ties between
    /// equal keys are broken by insertion order.
    pub fn q3_insert(&mut self, pid: u32, remaining_cpu: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.q3.push(Q3Entry { pid, remaining_cpu, seq });
    }

    pub fn q3_peek_min(&self) -> Option<u32> {
        self.q3
            .iter()
            .min_by_key(|e| (e.remaining_cpu, e.seq))
            .map(|e| e.pid)
    }

    pub fn q3_remove(&mut self, pid: u32) -> bool {
        match self.q3.iter().position(|e| e.pid == pid) {
            Some(idx) => {
                self.q3.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn q3_is_empty(&self) -> bool {
        self.q3.is_empty()
    }

    pub fn q3_len(&self) -> usize {
        self.q3.len()
    }
}

impl Default for QueueSet {
    fn default() -> Self {
        Self::new()
    }
}
