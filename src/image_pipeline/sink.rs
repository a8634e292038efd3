//! Log sinks
//!
//! The conversion pipeline reports every outcome as human-readable lines
//! through a `LogSink` supplied by its caller.

use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Local;
use tracing::info;

/// Receives the pipeline's user-facing log lines.
///
/// Implementations must accept calls from any thread and keep the lines of
/// a single call together.
pub trait LogSink: Send + Sync {
    fn add_log_line(&self, line: &str) {
        self.add_log_lines(&[line]);
    }

    fn add_log_lines(&self, lines: &[&str]);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic mid-append leaves nothing worth discarding.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Forwards lines to `tracing` at INFO level.
#[derive(Debug, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn add_log_lines(&self, lines: &[&str]) {
        for line in lines {
            info!(target: "imgconv::log", "{}", line);
        }
    }
}

/// Keeps lines in memory, for headless callers and tests.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        lock(&self.lines).clone()
    }

    pub fn clear(&self) {
        lock(&self.lines).clear();
    }
}

impl LogSink for MemoryLogSink {
    fn add_log_lines(&self, lines: &[&str]) {
        lock(&self.lines).extend(lines.iter().map(|line| line.to_string()));
    }
}

/// Writes each line prefixed with a local `HH:MM:SS.mmm::` timestamp.
pub struct TimestampedLogSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> TimestampedLogSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> LogSink for TimestampedLogSink<W> {
    fn add_log_lines(&self, lines: &[&str]) {
        let mut writer = lock(&self.writer);
        for line in lines {
            let stamp = Local::now().format("%H:%M:%S%.3f");
            // The sink has no error channel; a closed stdout just drops lines.
            let _ = writeln!(writer, "{}::{}", stamp, line);
        }
        let _ = writer.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemoryLogSink::new();
        sink.add_log_line("Reading: a.png");
        sink.add_log_lines(&["one", "two"]);
        assert_eq!(sink.lines(), vec!["Reading: a.png", "one", "two"]);

        sink.clear();
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_memory_sink_concurrent_batches_stay_together() {
        let sink = Arc::new(MemoryLogSink::new());
        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    let first = format!("{worker}-a");
                    let second = format!("{worker}-b");
                    sink.add_log_lines(&[first.as_str(), second.as_str()]);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let lines = sink.lines();
        assert_eq!(lines.len(), 8);
        for pair in lines.chunks(2) {
            let (worker, _) = pair[0].split_once('-').unwrap();
            assert_eq!(pair[1], format!("{worker}-b"));
        }
    }

    #[test]
    fn test_timestamped_sink_format() {
        let sink = TimestampedLogSink::new(Vec::new());
        sink.add_log_lines(&["Writing: b.gif", "done"]);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        let (stamp, text) = lines[0].split_once("::").unwrap();
        assert_eq!(stamp.len(), "00:00:00.000".len());
        assert_eq!(text, "Writing: b.gif");
        assert!(lines[1].ends_with("::done"));
    }
}
