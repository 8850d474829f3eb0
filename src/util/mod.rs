//! Utility modules for procstat.

mod clock;

pub use clock::clock_ticks_per_second;
pub(crate) use clock::DEFAULT_CLK_TCK;
