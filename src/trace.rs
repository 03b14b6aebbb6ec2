//! Gantt log and event log: the append-only records of what ran
//! when, and the human-readable trail of scheduling decisions.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algo {
    Rr1,
    Rr2,
    Srtf,
    Fcfs,
}

impl Algo {
    pub fn tag(self) -> &'static str {
        match self {
            Algo::Rr1 => "RR1",
            Algo::Rr2 => "RR2",
            Algo::Srtf => "SRTF",
            Algo::Fcfs => "FCFS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GanttSegment {
    pub pid: u32,
    pub start_tick: u64,
    pub end_tick: u64,
    pub algo: Algo,
}

#[derive(Debug, Default)]
pub struct EventLog(Vec<String>);

impl EventLog {
    pub fn push(&mut self, line: String) {
        self.0.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }
}
