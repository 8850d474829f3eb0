//! Parsers for `/proc` filesystem text.
//!
//! These are pure functions over already-read file content. Line selection
//! follows the `/proc` conventions the reader relies on: substring key match,
//! first matching line wins, whitespace tokenization of the remainder.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Selects one line of a file and the part of it that holds the values.
///
/// Without a key, the first line is selected. With a key, the first line
/// containing the key as a substring is selected, then cut either after the
/// first delimiter in the line or, with no delimiter, after the key plus one
/// separator character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineQuery<'a> {
    key: Option<&'a str>,
    delimiter: Option<char>,
}

impl<'a> LineQuery<'a> {
    /// Selects the first line, whole.
    pub const fn first_line() -> Self {
        Self {
            key: None,
            delimiter: None,
        }
    }

    /// Selects the first line containing `key`, cut after its first `:`.
    pub const fn key(key: &'a str) -> Self {
        Self {
            key: Some(key),
            delimiter: Some(':'),
        }
    }

    /// Selects the first line containing `key`, cut right after the key and
    /// one separator character. Used for `/proc/stat` style `name value` lines.
    pub const fn key_prefix(key: &'a str) -> Self {
        Self {
            key: Some(key),
            delimiter: None,
        }
    }

    /// Replaces the delimiter. `None` switches to cutting after the key.
    pub const fn with_delimiter(mut self, delimiter: Option<char>) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Returns the value part of the selected line, or `None` if no line
    /// contains the key.
    pub fn select<'t>(&self, content: &'t str) -> Option<&'t str> {
        let Some(key) = self.key.filter(|k| !k.is_empty()) else {
            return Some(content.lines().next().unwrap_or(""));
        };

        content.lines().find_map(|line| {
            let pos = line.find(key)?;
            let rest = match self.delimiter {
                // A line without the delimiter is kept whole.
                Some(delim) => line.split_once(delim).map_or(line, |(_, rest)| rest),
                None => {
                    let mut after_key = line[pos + key.len()..].chars();
                    after_key.next();
                    after_key.as_str()
                }
            };
            Some(rest)
        })
    }
}

/// Whitespace tokens of the line selected by `query`. Empty when no line
/// matched.
pub fn tokens_in<'t>(content: &'t str, query: &LineQuery<'_>) -> Vec<&'t str> {
    query
        .select(content)
        .map(|line| line.split_whitespace().collect())
        .unwrap_or_default()
}

/// Tokens of a `/proc/[pid]/stat` line.
///
/// The command name is kept as one token, taken between the first `(` and
/// the last `)`, so names with spaces or parentheses do not shift the
/// positions of the fields after it. Lines without parentheses are split on
/// whitespace.
pub fn stat_tokens(content: &str) -> Vec<&str> {
    let line = content.lines().next().unwrap_or("");

    let (Some(open), Some(close)) = (line.find('('), line.rfind(')')) else {
        return line.split_whitespace().collect();
    };
    if close <= open {
        return line.split_whitespace().collect();
    }

    let mut tokens = Vec::new();
    tokens.extend(line[..open].split_whitespace());
    tokens.push(&line[open + 1..close]);
    tokens.extend(line[close + 1..].split_whitespace());
    tokens
}

/// Tokens read from one line of one file, with positional accessors that
/// report missing or malformed fields as [`ParseError`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fields {
    source: PathBuf,
    tokens: Vec<String>,
}

impl Fields {
    pub fn new<S: AsRef<str>>(source: impl Into<PathBuf>, tokens: &[S]) -> Self {
        Self {
            source: source.into(),
            tokens: tokens.iter().map(|t| t.as_ref().to_string()).collect(),
        }
    }

    /// Selects a line of `content` and tokenizes it.
    pub fn from_text(source: impl Into<PathBuf>, content: &str, query: &LineQuery<'_>) -> Self {
        Self::new(source, &tokens_in(content, query))
    }

    /// `true` when the query matched no line (or an empty one).
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Returns the raw token at `idx`.
    pub fn get(&self, idx: usize, name: &str) -> Result<&str, ParseError> {
        self.tokens.get(idx).map(String::as_str).ok_or_else(|| {
            ParseError::new(format!(
                "missing field {} (index {}) in {}: line has {} fields",
                name,
                idx,
                self.source.display(),
                self.tokens.len()
            ))
        })
    }

    /// Parses the token at `idx`.
    pub fn parse<T: FromStr>(&self, idx: usize, name: &str) -> Result<T, ParseError> {
        let raw = self.get(idx, name)?;
        raw.parse().map_err(|_| {
            ParseError::new(format!(
                "invalid {} {:?} in {}",
                name,
                raw,
                self.source.display()
            ))
        })
    }
}

/// `true` for a non-empty name made only of ASCII digits.
pub fn is_pid_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

/// Counters of one `cpu`/`cpuN` line of `/proc/stat`, in clock ticks since boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CpuSample {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

impl CpuSample {
    /// Number of counters a `cpu` line must carry.
    pub const FIELD_COUNT: usize = 10;

    /// Builds a sample from the tokens after the `cpu` label.
    pub fn from_fields(fields: &Fields) -> Result<Self, ParseError> {
        if fields.len() < Self::FIELD_COUNT {
            return Err(ParseError::new(format!(
                "not enough cpu fields in {}: expected {}, got {}",
                fields.source().display(),
                Self::FIELD_COUNT,
                fields.len()
            )));
        }

        Ok(Self {
            user: fields.parse(0, "user")?,
            nice: fields.parse(1, "nice")?,
            system: fields.parse(2, "system")?,
            idle: fields.parse(3, "idle")?,
            iowait: fields.parse(4, "iowait")?,
            irq: fields.parse(5, "irq")?,
            softirq: fields.parse(6, "softirq")?,
            steal: fields.parse(7, "steal")?,
            guest: fields.parse(8, "guest")?,
            guest_nice: fields.parse(9, "guest_nice")?,
        })
    }

    /// Ticks spent doing work.
    pub fn active(&self) -> Result<u64, ParseError> {
        sum_ticks(
            "active",
            &[
                self.user,
                self.nice,
                self.system,
                self.irq,
                self.softirq,
                self.steal,
                self.guest,
                self.guest_nice,
            ],
        )
    }

    /// Ticks spent idle, including waiting on I/O.
    pub fn idle_total(&self) -> Result<u64, ParseError> {
        sum_ticks("idle", &[self.idle, self.iowait])
    }
}

fn sum_ticks(name: &str, counters: &[u64]) -> Result<u64, ParseError> {
    counters
        .iter()
        .try_fold(0u64, |acc, &ticks| acc.checked_add(ticks))
        .ok_or_else(|| ParseError::new(format!("{} cpu time overflows u64", name)))
}

/// CPU utilization between two samples of the same CPU line, in percent.
///
/// `first` must be the earlier sample. Fails when no time elapsed between the
/// two samples, instead of returning NaN, and when a counter went backwards.
pub fn system_cpu_percent(first: &CpuSample, second: &CpuSample) -> Result<f64, ParseError> {
    let active = second.active()? as f64 - first.active()? as f64;
    let idle = second.idle_total()? as f64 - first.idle_total()? as f64;

    if active < 0.0 || idle < 0.0 {
        return Err(ParseError::new(format!(
            "cpu counters went backwards (active delta {}, idle delta {})",
            active, idle
        )));
    }

    let total = active + idle;
    if total <= 0.0 {
        return Err(ParseError::new(format!(
            "cpu samples span no time (active delta {}, idle delta {})",
            active, idle
        )));
    }

    Ok(100.0 * active / total)
}

/// The three meminfo values the RAM percentage is computed from, in kB.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MemSample {
    pub available: f64,
    pub free: f64,
    pub buffers: f64,
}

impl MemSample {
    /// Extracts `MemAvailable`, `MemFree` and `Buffers` from meminfo content.
    pub fn from_meminfo(source: &Path, content: &str) -> Result<Self, ParseError> {
        let value = |key: &str| -> Result<f64, ParseError> {
            Fields::from_text(source, content, &LineQuery::key(key)).parse(0, key)
        };

        Ok(Self {
            available: value("MemAvailable")?,
            free: value("MemFree")?,
            buffers: value("Buffers")?,
        })
    }

    /// `100 * (1 - MemFree / (MemAvailable - Buffers))`.
    ///
    /// This is not the kernel's notion of used memory; the formula is kept
    /// as-is so readings stay comparable with existing consumers.
    pub fn ram_percent(&self) -> Result<f64, ParseError> {
        let denominator = self.available - self.buffers;
        if denominator <= 0.0 {
            return Err(ParseError::new(format!(
                "MemAvailable ({}) does not exceed Buffers ({})",
                self.available, self.buffers
            )));
        }
        Ok(100.0 * (1.0 - self.free / denominator))
    }
}

/// CPU time counters of one process, in clock ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProcessCpuTimes {
    pub utime: u64,
    pub stime: u64,
    pub cutime: i64,
    pub cstime: i64,
    /// Ticks after boot at which the process started.
    pub starttime: u64,
}

impl ProcessCpuTimes {
    /// Reads fields 13-16 and 21 of a tokenized `/proc/[pid]/stat` line.
    pub fn from_stat_fields(fields: &Fields) -> Result<Self, ParseError> {
        Ok(Self {
            utime: fields.parse(13, "utime")?,
            stime: fields.parse(14, "stime")?,
            cutime: fields.parse(15, "cutime")?,
            cstime: fields.parse(16, "cstime")?,
            starttime: fields.parse(21, "starttime")?,
        })
    }

    /// User-mode CPU time in seconds.
    pub fn up_time_secs(&self, clock_ticks: f64) -> f64 {
        self.utime as f64 / clock_ticks
    }

    /// Average CPU utilization since the process started, in percent.
    ///
    /// `utime` enters the sum already converted to seconds while `stime`,
    /// `cutime` and `cstime` stay in ticks. Existing consumers depend on this
    /// exact figure, so the units are not reconciled here.
    pub fn cpu_percent(&self, uptime_secs: f64, clock_ticks: f64) -> Result<f64, ParseError> {
        let total_time = self.up_time_secs(clock_ticks)
            + self.stime as f64
            + self.cutime as f64
            + self.cstime as f64;
        let elapsed = uptime_secs - self.starttime as f64 / clock_ticks;

        if elapsed <= 0.0 {
            return Err(ParseError::new(format!(
                "process elapsed time is not positive ({}s)",
                elapsed
            )));
        }

        Ok(100.0 * ((total_time / clock_ticks) / elapsed))
    }
}

/// Value of `PRETTY_NAME` in os-release content, with quotes removed.
pub fn parse_os_name(content: &str) -> Option<String> {
    LineQuery::key("PRETTY_NAME")
        .with_delimiter(Some('='))
        .select(content)
        .map(|value| value.replace('"', ""))
}

/// User name of the first passwd line containing `":x:<uid>"`.
///
/// This is a substring match: uid `100` also matches a `:x:1000` line if that
/// line comes first.
pub fn find_passwd_user<'t>(content: &'t str, uid: &str) -> Option<&'t str> {
    let needle = format!(":x:{}", uid);
    content
        .lines()
        .find_map(|line| line.find(&needle).map(|pos| &line[..pos]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(tokens: &[&str]) -> Fields {
        Fields::new("/proc/test", tokens)
    }

    #[test]
    fn test_first_line_query() {
        let tokens = tokens_in("12345.67 98765.43\nignored\n", &LineQuery::first_line());
        assert_eq!(tokens, vec!["12345.67", "98765.43"]);
    }

    #[test]
    fn test_first_line_of_empty_file() {
        assert!(tokens_in("", &LineQuery::first_line()).is_empty());
    }

    #[test]
    fn test_key_query_cuts_after_delimiter() {
        let content = "Name:\tbash\nVmData:\t    1234 kB\nThreads:\t1\n";
        assert_eq!(tokens_in(content, &LineQuery::key("VmData")), vec!["1234", "kB"]);
    }

    #[test]
    fn test_key_query_uses_first_delimiter_in_line() {
        // The cut happens at the first ':' of the line, not the one after the key.
        let content = "a:b VmData: 7\n";
        assert_eq!(tokens_in(content, &LineQuery::key("VmData")), vec!["b", "VmData:", "7"]);
    }

    #[test]
    fn test_key_query_without_delimiter_in_line_keeps_whole_line() {
        let content = "processes 10000\n";
        assert_eq!(tokens_in(content, &LineQuery::key("processes")), vec!["processes", "10000"]);
    }

    #[test]
    fn test_key_prefix_query() {
        let content = "cpu  10000 500 3000\ncpu0 2500 125 750\nprocesses 10000\n";
        assert_eq!(tokens_in(content, &LineQuery::key_prefix("cpu")), vec!["10000", "500", "3000"]);
        assert_eq!(tokens_in(content, &LineQuery::key_prefix("cpu0")), vec!["2500", "125", "750"]);
        assert_eq!(tokens_in(content, &LineQuery::key_prefix("processes")), vec!["10000"]);
    }

    #[test]
    fn test_key_prefix_at_end_of_line() {
        assert!(tokens_in("cpu\n", &LineQuery::key_prefix("cpu")).is_empty());
    }

    #[test]
    fn test_key_is_substring_match() {
        let content = "model name\t: x\ncpu cores\t: 4\n";
        assert_eq!(tokens_in(content, &LineQuery::key("cores")), vec!["4"]);
    }

    #[test]
    fn test_missing_key_yields_no_tokens() {
        let content = "MemTotal: 1 kB\n";
        assert!(tokens_in(content, &LineQuery::key("MemAvailable")).is_empty());
        assert!(LineQuery::key("MemAvailable").select(content).is_none());
    }

    #[test]
    fn test_stat_tokens_plain() {
        let tokens = stat_tokens("1 (systemd) S 0 1\n");
        assert_eq!(tokens, vec!["1", "systemd", "S", "0", "1"]);
    }

    #[test]
    fn test_stat_tokens_with_spaces_in_comm() {
        let tokens = stat_tokens("5678 (Web Content) S 1234 5678");
        assert_eq!(tokens, vec!["5678", "Web Content", "S", "1234", "5678"]);
    }

    #[test]
    fn test_stat_tokens_with_parentheses_in_comm() {
        let tokens = stat_tokens("99 (a) b) R 1");
        assert_eq!(tokens, vec!["99", "a) b", "R", "1"]);
    }

    #[test]
    fn test_stat_tokens_without_parentheses() {
        assert_eq!(stat_tokens("1 init S 0"), vec!["1", "init", "S", "0"]);
    }

    #[test]
    fn test_fields_get_out_of_range() {
        let err = fields(&["1", "2"]).get(5, "starttime").unwrap_err();
        assert!(err.message.contains("starttime"));
        assert!(err.message.contains("2 fields"));
    }

    #[test]
    fn test_fields_parse_invalid() {
        let err = fields(&["abc"]).parse::<u64>(0, "utime").unwrap_err();
        assert!(err.message.contains("invalid utime"));
    }

    #[test]
    fn test_is_pid_name() {
        assert!(is_pid_name("1"));
        assert!(is_pid_name("123456"));
        assert!(!is_pid_name(""));
        assert!(!is_pid_name("self"));
        assert!(!is_pid_name("12a"));
        assert!(!is_pid_name("-1"));
    }

    #[test]
    fn test_cpu_sample_from_fields() {
        let sample =
            CpuSample::from_fields(&fields(&["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"]))
                .unwrap();
        assert_eq!(sample.user, 1);
        assert_eq!(sample.guest_nice, 10);
        assert_eq!(sample.active().unwrap(), 1 + 2 + 3 + 6 + 7 + 8 + 9 + 10);
        assert_eq!(sample.idle_total().unwrap(), 4 + 5);
    }

    #[test]
    fn test_cpu_sample_truncated_line() {
        let err = CpuSample::from_fields(&fields(&["1", "2", "3", "4", "5", "6", "7", "8"]))
            .unwrap_err();
        assert!(err.message.contains("expected 10, got 8"));
    }

    #[test]
    fn test_cpu_sample_counter_overflow() {
        let sample = CpuSample::from_fields(&fields(&[
            "18446744073709551615",
            "1",
            "0",
            "0",
            "0",
            "0",
            "0",
            "0",
            "0",
            "0",
        ]))
        .unwrap();
        let err = sample.active().unwrap_err();
        assert!(err.message.contains("overflows"));
        assert_eq!(sample.idle_total().unwrap(), 0);
        assert!(system_cpu_percent(&sample, &sample).is_err());
    }

    #[test]
    fn test_system_cpu_percent() {
        let first = CpuSample {
            user: 100,
            idle: 900,
            ..CpuSample::default()
        };
        let second = CpuSample {
            user: 125,
            idle: 975,
            ..CpuSample::default()
        };
        let percent = system_cpu_percent(&first, &second).unwrap();
        assert!((percent - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_system_cpu_percent_idle_only_is_zero() {
        let first = CpuSample {
            user: 100,
            idle: 900,
            ..CpuSample::default()
        };
        let second = CpuSample {
            idle: 1000,
            ..first
        };
        assert_eq!(system_cpu_percent(&first, &second).unwrap(), 0.0);
    }

    #[test]
    fn test_system_cpu_percent_identical_samples_fail() {
        let sample = CpuSample {
            user: 100,
            idle: 900,
            ..CpuSample::default()
        };
        assert!(system_cpu_percent(&sample, &sample).is_err());
    }

    #[test]
    fn test_system_cpu_percent_counter_reset() {
        let first = CpuSample {
            user: 5000,
            idle: 900,
            ..CpuSample::default()
        };
        // Active ticks dropped while idle ticks grew.
        let second = CpuSample {
            user: 100,
            idle: 9000,
            ..CpuSample::default()
        };
        let err = system_cpu_percent(&first, &second).unwrap_err();
        assert!(err.message.contains("went backwards"));
    }

    #[test]
    fn test_ram_percent_formula() {
        let mem = MemSample {
            available: 12_000_000.0,
            free: 8_192_000.0,
            buffers: 512_000.0,
        };
        let expected = 100.0 * (1.0 - 8_192_000.0 / 11_488_000.0);
        assert!((mem.ram_percent().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_ram_percent_decreases_with_free_memory() {
        let mut mem = MemSample {
            available: 12_000_000.0,
            free: 1_000_000.0,
            buffers: 512_000.0,
        };
        let mut last = mem.ram_percent().unwrap();
        for _ in 0..5 {
            mem.free += 1_000_000.0;
            let next = mem.ram_percent().unwrap();
            assert!(next < last);
            last = next;
        }
    }

    #[test]
    fn test_ram_percent_degenerate_denominator() {
        let mem = MemSample {
            available: 512.0,
            free: 100.0,
            buffers: 512.0,
        };
        assert!(mem.ram_percent().is_err());
    }

    #[test]
    fn test_mem_sample_from_meminfo() {
        let content = "MemTotal: 100 kB\nMemFree: 10 kB\nMemAvailable: 60 kB\nBuffers: 5 kB\n";
        let mem = MemSample::from_meminfo(Path::new("/proc/meminfo"), content).unwrap();
        assert_eq!(mem.free, 10.0);
        assert_eq!(mem.available, 60.0);
        assert_eq!(mem.buffers, 5.0);
    }

    #[test]
    fn test_mem_sample_missing_key() {
        let content = "MemTotal: 100 kB\nMemFree: 10 kB\nBuffers: 5 kB\n";
        let err = MemSample::from_meminfo(Path::new("/proc/meminfo"), content).unwrap_err();
        assert!(err.message.contains("MemAvailable"));
    }

    #[test]
    fn test_process_cpu_percent_keeps_mixed_units() {
        let mut tokens = vec!["0"; 22];
        tokens[13] = "1000"; // utime: 10s at 100 Hz
        tokens[14] = "200";
        tokens[21] = "50000"; // started 500s after boot
        let times = ProcessCpuTimes::from_stat_fields(&fields(&tokens)).unwrap();

        // (10 + 200 + 0 + 0) / 100 over 500s elapsed.
        let percent = times.cpu_percent(1000.0, 100.0).unwrap();
        assert!((percent - 0.42).abs() < 1e-9);
    }

    #[test]
    fn test_process_cpu_percent_requires_elapsed_time() {
        let times = ProcessCpuTimes {
            starttime: 100_000,
            ..ProcessCpuTimes::default()
        };
        assert!(times.cpu_percent(1000.0, 100.0).is_err());
    }

    #[test]
    fn test_process_cpu_times_short_line() {
        let tokens = vec!["0"; 21];
        let err = ProcessCpuTimes::from_stat_fields(&fields(&tokens)).unwrap_err();
        assert!(err.message.contains("starttime"));
    }

    #[test]
    fn test_parse_os_name() {
        let content = "NAME=\"Test\"\nPRETTY_NAME=\"Test OS 1.0\"\n";
        assert_eq!(parse_os_name(content).as_deref(), Some("Test OS 1.0"));
        assert_eq!(parse_os_name("NAME=x\n"), None);
    }

    #[test]
    fn test_find_passwd_user() {
        let content = "root:x:0:0:root:/root:/bin/bash\nalice:x:1000:1000::/home/alice:/bin/sh\n";
        assert_eq!(find_passwd_user(content, "1000"), Some("alice"));
        assert_eq!(find_passwd_user(content, "0"), Some("root"));
        assert_eq!(find_passwd_user(content, "4242"), None);
    }

    #[test]
    fn test_find_passwd_user_substring_semantics() {
        let content = "alice:x:1000:1000::/home/alice:/bin/sh\nbob:x:100:100::/home/bob:/bin/sh\n";
        assert_eq!(find_passwd_user(content, "100"), Some("alice"));
    }
}
