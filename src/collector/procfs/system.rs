//! System-wide queries over the global `/proc` files and `/etc`.

use crate::collector::procfs::parser::{
    CpuSample, Fields, LineQuery, MemSample, ParseError, parse_os_name,
};
use crate::collector::procfs::reader::{StatError, StatReader};
use crate::collector::traits::FileSystem;
use serde::Serialize;
use tracing::debug;

/// System-wide readings, gathered by [`StatReader::system_summary`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSummary {
    /// Unix timestamp at which the summary was taken.
    pub sampled_at: i64,
    pub os_name: String,
    pub kernel_version: String,
    pub cores: u32,
    pub uptime_secs: f64,
    pub ram_percent: f64,
    pub total_processes: u64,
    pub running_processes: u64,
    pub total_threads: u64,
}

impl<F: FileSystem> StatReader<F> {
    /// Seconds since boot, from the first field of `/proc/uptime`.
    pub fn uptime(&self) -> Result<f64, StatError> {
        let fields = self.extract_tokens(&self.paths.uptime(), &LineQuery::first_line())?;
        Ok(fields.parse(0, "uptime")?)
    }

    /// Counters of the aggregate `cpu` line, or of `cpuN` when `core` is set.
    ///
    /// Take two samples some time apart and pass them to
    /// [`system_cpu_percent`](crate::collector::procfs::system_cpu_percent).
    pub fn cpu_sample(&self, core: Option<u32>) -> Result<CpuSample, StatError> {
        let key = match core {
            Some(n) => format!("cpu{}", n),
            None => "cpu".to_string(),
        };
        let fields = self.extract_tokens(&self.paths.stat(), &LineQuery::key_prefix(&key))?;
        if fields.is_empty() {
            return Err(ParseError::new(format!(
                "no {} line in {}",
                key,
                fields.source().display()
            ))
            .into());
        }
        Ok(CpuSample::from_fields(&fields)?)
    }

    /// Counters of every `cpuN` line, in the order the kernel lists them.
    pub fn core_samples(&self) -> Result<Vec<CpuSample>, StatError> {
        let path = self.paths.stat();
        let content = self.read(&path)?;

        let mut samples = Vec::new();
        for line in content.lines() {
            let Some((label, values)) = line.split_once(char::is_whitespace) else {
                continue;
            };
            let is_core = label
                .strip_prefix("cpu")
                .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()));
            if !is_core {
                continue;
            }

            let tokens: Vec<&str> = values.split_whitespace().collect();
            samples.push(CpuSample::from_fields(&Fields::new(&path, &tokens))?);
        }

        Ok(samples)
    }

    /// RAM usage in percent from one read of `/proc/meminfo`.
    ///
    /// See [`MemSample::ram_percent`] for the formula.
    pub fn ram_percent(&self) -> Result<f64, StatError> {
        Ok(self.mem_sample()?.ram_percent()?)
    }

    /// `MemAvailable`, `MemFree` and `Buffers` from one read of `/proc/meminfo`.
    pub fn mem_sample(&self) -> Result<MemSample, StatError> {
        let path = self.paths.meminfo();
        let content = self.read(&path)?;
        Ok(MemSample::from_meminfo(&path, &content)?)
    }

    /// Kernel release, the third word of `/proc/version`.
    pub fn kernel_version(&self) -> Result<String, StatError> {
        let fields = self.extract_tokens(&self.paths.version(), &LineQuery::first_line())?;
        Ok(fields.get(2, "kernel version")?.to_string())
    }

    /// `PRETTY_NAME` from os-release.
    pub fn os_name(&self) -> Result<String, StatError> {
        let path = self.paths.os_release();
        let content = self.read(path)?;
        let name = parse_os_name(&content)
            .ok_or_else(|| ParseError::new(format!("no PRETTY_NAME in {}", path.display())))?;
        Ok(name)
    }

    /// Sum of the thread counts of all listed processes.
    ///
    /// Processes that exit between the listing and the read of their status
    /// file are left out of the sum; any other failure is returned.
    pub fn total_threads(&self) -> Result<u64, StatError> {
        let mut total = 0;
        for pid in self.pids()? {
            match self.threads(pid) {
                Ok(threads) => total += threads,
                Err(e) if e.is_gone() => {
                    debug!(pid, "process exited before its thread count was read");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }

    /// Processes created since boot (`processes` in `/proc/stat`).
    pub fn total_processes(&self) -> Result<u64, StatError> {
        let fields =
            self.extract_tokens(&self.paths.stat(), &LineQuery::key_prefix("processes"))?;
        Ok(fields.parse(0, "processes")?)
    }

    /// Processes currently runnable (`procs_running` in `/proc/stat`).
    pub fn running_processes(&self) -> Result<u64, StatError> {
        let fields =
            self.extract_tokens(&self.paths.stat(), &LineQuery::key_prefix("procs_running"))?;
        Ok(fields.parse(0, "procs_running")?)
    }

    /// `cpu cores` of the first processor in `/proc/cpuinfo`.
    pub fn core_count(&self) -> Result<u32, StatError> {
        let fields = self.extract_tokens(&self.paths.cpuinfo(), &LineQuery::key("cpu cores"))?;
        Ok(fields.parse(0, "cpu cores")?)
    }

    /// Reads every system-wide value. Each value comes from its own read.
    pub fn system_summary(&self) -> Result<SystemSummary, StatError> {
        Ok(SystemSummary {
            sampled_at: chrono::Utc::now().timestamp(),
            os_name: self.os_name()?,
            kernel_version: self.kernel_version()?,
            cores: self.core_count()?,
            uptime_secs: self.uptime()?,
            ram_percent: self.ram_percent()?,
            total_processes: self.total_processes()?,
            running_processes: self.running_processes()?,
            total_threads: self.total_threads()?,
        })
    }
}
