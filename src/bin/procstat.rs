//! procstat - one-shot dump of process and system statistics.
//!
//! Usage:
//!   procstat                    # system summary and CPU usage over 250ms
//!   procstat -p 1 -p 1234       # also per-process readings
//!   procstat --json             # machine-readable output
//!   procstat --proc-path /host/proc --passwd-path /host/etc/passwd

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use tracing::{Level, debug, error, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use procstat::collector::procfs::{ProcessSample, SystemSummary, system_cpu_percent};
use procstat::collector::{FileSystem, ProcPaths, RealFs, StatError, StatReader};

/// One-shot dump of process and system statistics from /proc.
#[derive(Parser)]
#[command(name = "procstat", about = "Process and system statistics from /proc", version)]
struct Args {
    /// Path to /proc filesystem.
    #[arg(long, default_value = "/proc")]
    proc_path: PathBuf,

    /// Path to the passwd file used for user names.
    #[arg(long, default_value = "/etc/passwd")]
    passwd_path: PathBuf,

    /// Path to the os-release file.
    #[arg(long, default_value = "/etc/os-release")]
    os_release_path: PathBuf,

    /// Process to report on. May be repeated.
    #[arg(short, long = "pid", value_name = "PID")]
    pids: Vec<u32>,

    /// Time between the two CPU samples, in milliseconds.
    #[arg(long, default_value = "250")]
    cpu_window_ms: u64,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is warn level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Serialize)]
struct Report {
    system: SystemSummary,
    /// `None` when the two samples span no time.
    cpu_percent: Option<f64>,
    processes: Vec<ProcessSample>,
}

/// Initializes the tracing subscriber on stderr, leaving stdout to the report.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("procstat={}", level).parse::<Directive>() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn collect<F: FileSystem>(reader: &StatReader<F>, args: &Args) -> Result<Report, StatError> {
    let first = reader.cpu_sample(None)?;
    thread::sleep(Duration::from_millis(args.cpu_window_ms));
    let second = reader.cpu_sample(None)?;
    let cpu_percent = match system_cpu_percent(&first, &second) {
        Ok(percent) => Some(percent),
        Err(e) => {
            warn!("cpu usage unavailable: {}", e);
            None
        }
    };

    let system = reader.system_summary()?;

    let mut processes = Vec::with_capacity(args.pids.len());
    for &pid in &args.pids {
        match reader.process_sample(pid) {
            Ok(sample) => processes.push(sample),
            Err(e) if e.is_gone() => warn!(pid, "process no longer exists"),
            Err(e) => warn!(pid, error = %e, "failed to read process"),
        }
    }

    Ok(Report {
        system,
        cpu_percent,
        processes,
    })
}

fn print_text(report: &Report) {
    let s = &report.system;
    println!("OS:          {}", s.os_name);
    println!("Kernel:      {}", s.kernel_version);
    println!("Cores:       {}", s.cores);
    println!("Uptime:      {:.0}s", s.uptime_secs);
    match report.cpu_percent {
        Some(cpu) => println!("CPU:         {:.1}%", cpu),
        None => println!("CPU:         n/a"),
    }
    println!("RAM:         {:.1}%", s.ram_percent);
    println!("Processes:   {} ({} running)", s.total_processes, s.running_processes);
    println!("Threads:     {}", s.total_threads);

    if report.processes.is_empty() {
        return;
    }
    println!();
    println!(
        "{:>8} {:<12} {:>10} {:>10} {:>7}  COMMAND",
        "PID", "USER", "VMDATA(kB)", "UTIME(s)", "CPU%"
    );
    for p in &report.processes {
        println!(
            "{:>8} {:<12} {:>10} {:>10.2} {:>7.2}  {}",
            p.pid, p.user, p.vm_data_kb, p.up_time_secs, p.cpu_percent, p.command
        );
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let paths = ProcPaths {
        proc_root: args.proc_path.clone(),
        passwd: args.passwd_path.clone(),
        os_release: args.os_release_path.clone(),
    };
    debug!(?paths, "reading statistics");
    let reader = StatReader::new(RealFs::new(), paths);
    debug!(clock_ticks = reader.clock_ticks(), "clock tick frequency");

    let report = match collect(&reader, &args) {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("failed to serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_text(&report);
    }

    ExitCode::SUCCESS
}
