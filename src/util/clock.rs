//! Kernel clock tick frequency.

use std::sync::LazyLock;

/// Used when `sysconf` cannot report the frequency. USER_HZ is 100 on
/// every mainstream Linux architecture.
pub(crate) const DEFAULT_CLK_TCK: f64 = 100.0;

static CLK_TCK: LazyLock<f64> = LazyLock::new(detect_clock_ticks);

/// Clock ticks per second (`_SC_CLK_TCK`), the unit of `/proc` CPU times.
///
/// The result is cached after the first call.
pub fn clock_ticks_per_second() -> f64 {
    *CLK_TCK
}

fn detect_clock_ticks() -> f64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf has no preconditions; it returns -1 on error.
        let tck = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        if tck > 0 {
            return tck as f64;
        }
    }
    DEFAULT_CLK_TCK
}
