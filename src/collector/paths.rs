//! Locations of the files the reader consumes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Path roots for `/proc` and the two `/etc` files.
///
/// Every file the reader opens is derived from these three values, so tests
/// and containerized deployments can point the reader at a different tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcPaths {
    pub proc_root: PathBuf,
    pub passwd: PathBuf,
    pub os_release: PathBuf,
}

impl Default for ProcPaths {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            passwd: PathBuf::from("/etc/passwd"),
            os_release: PathBuf::from("/etc/os-release"),
        }
    }
}

impl ProcPaths {
    /// Creates paths rooted at `proc_root`, keeping the default `/etc` files.
    pub fn with_proc_root(proc_root: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            ..Self::default()
        }
    }

    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    /// `/proc/[pid]`
    pub fn process_dir(&self, pid: u32) -> PathBuf {
        self.proc_root.join(pid.to_string())
    }

    /// `/proc/[pid]/cmdline`
    pub fn cmdline(&self, pid: u32) -> PathBuf {
        self.process_dir(pid).join("cmdline")
    }

    /// `/proc/[pid]/status`
    pub fn status(&self, pid: u32) -> PathBuf {
        self.process_dir(pid).join("status")
    }

    /// `/proc/[pid]/stat`
    pub fn process_stat(&self, pid: u32) -> PathBuf {
        self.process_dir(pid).join("stat")
    }

    /// `/proc/stat`
    pub fn stat(&self) -> PathBuf {
        self.proc_root.join("stat")
    }

    pub fn meminfo(&self) -> PathBuf {
        self.proc_root.join("meminfo")
    }

    pub fn uptime(&self) -> PathBuf {
        self.proc_root.join("uptime")
    }

    pub fn version(&self) -> PathBuf {
        self.proc_root.join("version")
    }

    pub fn cpuinfo(&self) -> PathBuf {
        self.proc_root.join("cpuinfo")
    }

    pub fn passwd(&self) -> &Path {
        &self.passwd
    }

    pub fn os_release(&self) -> &Path {
        &self.os_release
    }
}
