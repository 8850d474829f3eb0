//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` and `/etc` states.

use super::filesystem::MockFs;

impl MockFs {
    /// Creates a typical system with a few processes.
    ///
    /// Includes: init (PID 1), a bash shell owned by `user`, a browser
    /// content process whose name contains a space, and the usual global
    /// files under `/proc` and `/etc`.
    pub fn typical_system() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/etc/passwd",
            "\
root:x:0:0:root:/root:/bin/bash
daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin
bin:x:2:2:bin:/bin:/usr/sbin/nologin
sys:x:3:3:sys:/dev:/usr/sbin/nologin
nobody:x:65534:65534:nobody:/nonexistent:/usr/sbin/nologin
user:x:1000:1000:User:/home/user:/bin/bash
",
        );
        fs.add_file(
            "/etc/os-release",
            "\
NAME=\"Debian GNU/Linux\"
VERSION_ID=\"12\"
PRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"
ID=debian
",
        );

        fs.add_file("/proc/uptime", "12345.67 98765.43\n");
        fs.add_file(
            "/proc/version",
            "Linux version 6.1.0-18-amd64 (debian-kernel@lists.debian.org) \
             (gcc-12 (Debian 12.2.0-14) 12.2.0) #1 SMP PREEMPT_DYNAMIC Debian 6.1.76-1\n",
        );
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:            0 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
",
        );
        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );
        fs.add_file(
            "/proc/cpuinfo",
            "\
processor\t: 0
vendor_id\t: GenuineIntel
model name\t: Intel(R) Core(TM) i7-8550U CPU @ 1.80GHz
physical id\t: 0
siblings\t: 4
core id\t\t: 0
cpu cores\t: 4
apicid\t\t: 0
",
        );

        // Non-process entries that must not be listed as pids.
        fs.add_dir("/proc/sys");
        fs.add_dir("/proc/self");

        fs.add_process(
            1,
            "1 (systemd) S 0 1 1 0 -1 4194560 50000 1000000 100 500 150 80 3000 1500 20 0 1 0 10 170000000 3000 18446744073709551615 1 1 0 0 0 0 671173123 4096 1260 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "\
Name:\tsystemd
State:\tS (sleeping)
Pid:\t1
PPid:\t0
Uid:\t0\t0\t0\t0
Gid:\t0\t0\t0\t0
VmPeak:\t  170000 kB
VmSize:\t  166000 kB
VmRSS:\t   12000 kB
VmData:\t   20000 kB
Threads:\t1
",
            "/sbin/init\0splash\0",
        );

        fs.add_process(
            1234,
            "1234 (bash) S 1233 1234 1234 34816 1234 4194304 2000 10000 5 20 500 200 100 50 20 0 1 0 500000 25000000 1500 18446744073709551615 1 1 0 0 0 0 65536 3670020 1266777851 0 0 0 17 2 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "\
Name:\tbash
State:\tS (sleeping)
Pid:\t1234
PPid:\t1233
Uid:\t1000\t1000\t1000\t1000
Gid:\t1000\t1000\t1000\t1000
VmSize:\t   25000 kB
VmRSS:\t    6000 kB
VmData:\t    1234 kB
Threads:\t1
",
            "/bin/bash\0--login\0",
        );

        fs.add_process(
            5678,
            "5678 (Web Content) S 1234 5678 1234 0 -1 4194560 90000 0 300 0 4000 1000 0 0 20 0 25 0 900000 3000000000 80000 18446744073709551615 1 1 0 0 0 0 0 4096 17663 0 0 0 17 1 0 0 0 0 0 0 0 0 0 0 0 0 0",
            "\
Name:\tWeb Content
State:\tS (sleeping)
Pid:\t5678
PPid:\t1234
Uid:\t1000\t1000\t1000\t1000
Gid:\t1000\t1000\t1000\t1000
VmSize:\t 3000000 kB
VmRSS:\t  320000 kB
VmData:\t  800000 kB
Threads:\t25
",
            "/usr/lib/firefox/firefox\0-contentproc\0",
        );

        fs
    }

    /// Creates a system whose `/proc/stat` lacks the `guest` columns and
    /// whose meminfo has no `MemAvailable`, like kernels before 3.14.
    pub fn legacy_kernel() -> Self {
        let mut fs = Self::typical_system();
        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0
cpu0 10000 500 3000 80000 1000 200 100 0
processes 10000
procs_running 1
",
        );
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
Buffers:          512000 kB
",
        );
        fs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::traits::FileSystem;
    use std::path::Path;

    #[test]
    fn test_typical_system_has_processes() {
        let fs = MockFs::typical_system();
        for pid in ["1", "1234", "5678"] {
            let dir = Path::new("/proc").join(pid);
            assert!(fs.is_dir(&dir), "missing {:?}", dir);
            assert!(fs.read_to_string(&dir.join("stat")).is_ok());
        }
    }

    #[test]
    fn test_legacy_kernel_overrides_globals() {
        let fs = MockFs::legacy_kernel();
        let meminfo = fs.read_to_string(Path::new("/proc/meminfo")).unwrap();
        assert!(!meminfo.contains("MemAvailable"));
    }
}
