//! procstat - process and system telemetry from `/proc`.
//!
//! Reads per-process and system-wide statistics (CPU, memory, uptime,
//! process and thread counts, owning user, kernel version, OS name) and
//! turns the text into typed values. Sampling loops and presentation are
//! left to the caller.

pub mod collector;
pub mod util;
