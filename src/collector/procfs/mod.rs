//! Readers for the Linux `/proc` filesystem.
//!
//! `parser` holds the pure text functions; `reader` the [`StatReader`] type
//! and its file primitive; `process` and `system` the queries built on them.

pub mod parser;
mod process;
mod reader;
mod system;

pub use parser::{
    CpuSample, Fields, LineQuery, MemSample, ParseError, ProcessCpuTimes, system_cpu_percent,
};
pub use process::ProcessSample;
pub use reader::{StatError, StatReader};
pub use system::SystemSummary;
