//! Per-process queries over `/proc/[pid]/`.

use crate::collector::procfs::parser::{
    Fields, LineQuery, ParseError, ProcessCpuTimes, find_passwd_user, is_pid_name, stat_tokens,
};
use crate::collector::procfs::reader::{StatError, StatReader};
use crate::collector::traits::FileSystem;
use serde::Serialize;
use tracing::trace;

/// One process's readings, gathered by [`StatReader::process_sample`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessSample {
    pub pid: u32,
    pub command: String,
    pub user: String,
    /// `VmData` in kB.
    pub vm_data_kb: u64,
    /// User-mode CPU time in seconds.
    pub up_time_secs: f64,
    pub cpu_percent: f64,
}

impl<F: FileSystem> StatReader<F> {
    /// Lists running process ids in ascending order.
    ///
    /// Only directories whose name is made of digits count; `self`, `sys` and
    /// the global files are skipped.
    pub fn pids(&self) -> Result<Vec<u32>, StatError> {
        let root = self.paths.proc_root();
        let entries = self.fs.read_dir(root).map_err(|e| StatError::io(root, e))?;

        let mut pids: Vec<u32> = entries
            .iter()
            .filter(|path| self.fs.is_dir(path))
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?;
                if !is_pid_name(name) {
                    return None;
                }
                name.parse().ok()
            })
            .collect();
        pids.sort_unstable();

        trace!(count = pids.len(), "listed processes");
        Ok(pids)
    }

    /// Returns `true` if `pid` is currently listed under the proc root.
    pub fn pid_exists(&self, pid: u32) -> Result<bool, StatError> {
        Ok(self.pids()?.binary_search(&pid).is_ok())
    }

    /// First word of the process command line.
    ///
    /// Arguments in `cmdline` are NUL separated; they are split like
    /// whitespace. Kernel threads have an empty command line and yield a
    /// [`ParseError`].
    pub fn command(&self, pid: u32) -> Result<String, StatError> {
        let path = self.paths.cmdline(pid);
        let content = self.read(&path)?.replace('\0', " ");
        let fields = Fields::from_text(&path, &content, &LineQuery::first_line());
        Ok(fields.get(0, "command")?.to_string())
    }

    /// `VmData` from `/proc/[pid]/status`, in kB.
    pub fn vm_data_kb(&self, pid: u32) -> Result<u64, StatError> {
        let fields = self.extract_tokens(&self.paths.status(pid), &LineQuery::key("VmData"))?;
        Ok(fields.parse(0, "VmData")?)
    }

    /// Thread count from `/proc/[pid]/status`.
    pub fn threads(&self, pid: u32) -> Result<u64, StatError> {
        let fields = self.extract_tokens(&self.paths.status(pid), &LineQuery::key("Threads"))?;
        Ok(fields.parse(0, "Threads")?)
    }

    /// Name of the user owning the process (real UID).
    pub fn user(&self, pid: u32) -> Result<String, StatError> {
        let fields = self.extract_tokens(&self.paths.status(pid), &LineQuery::key("Uid"))?;
        let uid = fields.get(0, "Uid")?;

        let passwd = self.paths.passwd();
        let content = self.read(passwd)?;
        let user = find_passwd_user(&content, uid).ok_or_else(|| {
            ParseError::new(format!("uid {} not found in {}", uid, passwd.display()))
        })?;
        Ok(user.to_string())
    }

    /// Tokenized `/proc/[pid]/stat` line, command name kept as one token.
    pub fn stat_fields(&self, pid: u32) -> Result<Fields, StatError> {
        let path = self.paths.process_stat(pid);
        let content = self.read(&path)?;
        Ok(Fields::new(&path, &stat_tokens(&content)))
    }

    /// CPU time counters from one read of `/proc/[pid]/stat`.
    pub fn cpu_times(&self, pid: u32) -> Result<ProcessCpuTimes, StatError> {
        Ok(ProcessCpuTimes::from_stat_fields(&self.stat_fields(pid)?)?)
    }

    /// User-mode CPU time of the process in seconds (`utime / hz`).
    pub fn process_up_time(&self, pid: u32) -> Result<f64, StatError> {
        let utime: u64 = self.stat_fields(pid)?.parse(13, "utime")?;
        Ok(utime as f64 / self.clock_ticks)
    }

    /// Average CPU utilization of the process since it started, in percent.
    ///
    /// See [`ProcessCpuTimes::cpu_percent`] for the exact formula.
    pub fn cpu_percent(&self, pid: u32) -> Result<f64, StatError> {
        let times = self.cpu_times(pid)?;
        let uptime = self.uptime()?;
        Ok(times.cpu_percent(uptime, self.clock_ticks)?)
    }

    /// Reads every per-process value for `pid`.
    ///
    /// The stat file is read once for both time figures; the other files are
    /// read separately, so the sample is not atomic.
    pub fn process_sample(&self, pid: u32) -> Result<ProcessSample, StatError> {
        let times = self.cpu_times(pid)?;
        let uptime = self.uptime()?;

        Ok(ProcessSample {
            pid,
            command: self.command(pid)?,
            user: self.user(pid)?,
            vm_data_kb: self.vm_data_kb(pid)?,
            up_time_secs: times.up_time_secs(self.clock_ticks),
            cpu_percent: times.cpu_percent(uptime, self.clock_ticks)?,
        })
    }
}
