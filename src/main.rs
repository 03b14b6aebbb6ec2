use clap::Parser;
use feedback_scheduler_sim::{parse_workload, SchedulerConfig, Simulator};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "feedback-scheduler-sim", about = "Simulate a four-level multilevel feedback queue scheduler")]
struct Args {
    /// Workload file: one process per line, tab-separated
    /// pid, arrival_time, cpu, io, cpu, io, ..., cpu.
    workload: String,

    /// RR1 time quantum.
    #[arg(long, default_value_t = 2)]
    q1: u64,

    /// RR2 time quantum.
    #[arg(long, default_value_t = 4)]
    q2: u64,

    /// Smoothing factor for the burst predictor (unused by scheduling).
    #[arg(long, default_value_t = 0.5)]
    alpha: f64,

    /// Safety bound on simulated ticks.
    #[arg(long, default_value_t = feedback_scheduler_sim::DEFAULT_MAX_TIME)]
    max_time: u64,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let text = match std::fs::read_to_string(&args.workload) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("error: couldn't read workload file {:?}: {err}", args.workload);
            return ExitCode::FAILURE;
        }
    };

    let processes = match parse_workload(&text) {
        Ok(processes) => processes,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let config = SchedulerConfig::new(args.q1, args.q2, args.alpha).with_max_time(args.max_time);
    let mut sim = Simulator::new(processes, config);
    let report = sim.run();

    println!("=== Gantt Trace ===");
    for seg in &report.gantt {
        println!(
            "[{:>5} - {:>5}]  process {:<4} {}",
            seg.start_tick,
            seg.end_tick,
            seg.pid,
            seg.algo.tag()
        );
    }

    println!("\n=== Event Log ===");
    for line in &report.events {
        println!("{line}");
    }

    println!("\n=== Process Metrics ===");
    println!(
        "{:>5} {:>8} {:>8} {:>8} {:>8} {:>10}  {:<16} {:<16}",
        "pid", "arrival", "start", "complete", "waiting", "turnaround", "cpu bursts", "io bursts"
    );
    for p in &report.processes {
        let bursts = report.original_bursts.iter().find(|b| b.pid == p.pid);
        let cpu_bursts = bursts.map(|b| join(&b.cpu_bursts)).unwrap_or_default();
        let io_bursts = bursts.map(|b| join(&b.io_bursts)).unwrap_or_default();
        println!(
            "{:>5} {:>8} {:>8} {:>8} {:>8} {:>10}  {:<16} {:<16}",
            p.pid,
            p.arrival_time,
            p.start_time,
            p.complete_time,
            p.waiting_time,
            p.turnaround_time,
            cpu_bursts,
            io_bursts
        );
    }

    println!("\n=== Aggregate Metrics ===");
    println!("CPU utilization:      {:>6.1}%", report.cpu_utilization);
    println!("Average waiting time: {:>6.1}", report.avg_waiting_time);
    println!("Total simulated time: {:>6}", report.current_time);

    if report.hit_safety_cap {
        eprintln!("\nwarning: simulation stopped at the safety bound before all processes terminated");
    }

    ExitCode::SUCCESS
}

fn join(values: &[u64]) -> String {
    values.iter().map(u64::to_string).collect::<Vec<_>>().join(", ")
}
