//! Process and system statistics from the Linux `/proc` filesystem.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        StatReader                           │
//! │  ┌─────────────────────┐   ┌─────────────────────────────┐  │
//! │  │  process queries    │   │     system queries          │  │
//! │  │  - /proc/[pid]/*    │   │  - /proc/{stat,meminfo,...} │  │
//! │  │  - /etc/passwd      │   │  - /etc/os-release          │  │
//! │  └──────────┬──────────┘   └──────────────┬──────────────┘  │
//! │             └───────── parser ────────────┘                 │
//! │                            │                                │
//! │                     ┌──────▼──────┐                         │
//! │                     │  FileSystem │ (trait)                 │
//! │                     └──────┬──────┘                         │
//! └────────────────────────────┼────────────────────────────────┘
//!                  ┌───────────┴───────────┐
//!           ┌──────▼──────┐         ┌──────▼──────┐
//!           │   RealFs    │         │   MockFs    │
//!           │  (Linux)    │         │  (Testing)  │
//!           └─────────────┘         └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use procstat::collector::{MockFs, ProcPaths, StatReader};
//! use procstat::collector::procfs::system_cpu_percent;
//!
//! let reader = StatReader::new(MockFs::typical_system(), ProcPaths::default());
//! let first = reader.cpu_sample(None).unwrap();
//! // ...wait, then sample again...
//! let second = reader.cpu_sample(None).unwrap();
//! assert!(system_cpu_percent(&first, &second).is_err()); // no time passed
//! assert_eq!(reader.os_name().unwrap(), "Debian GNU/Linux 12 (bookworm)");
//! ```

pub mod mock;
pub mod paths;
pub mod procfs;
pub mod traits;

pub use mock::MockFs;
pub use paths::ProcPaths;
pub use procfs::{ParseError, StatError, StatReader};
pub use traits::{FileSystem, RealFs};
