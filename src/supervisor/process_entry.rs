// src/supervisor/process_entry.rs
// Transient per-running-child state. Mutated by the stdout reader and the reaper.

use std::collections::VecDeque;

const LOG_RING_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Running,
    Stopped,
}

pub struct ProcessEntry {
    pub pid: i32,
    pub port: u16,
    pub status: ProcessStatus,
    pub log_ring: LogRing,
    pub launch_url: Option<String>,
}

impl ProcessEntry {
    pub fn new(pid: i32, port: u16) -> Self {
        Self {
            pid,
            port,
            status: ProcessStatus::Running,
            log_ring: LogRing::new(),
            launch_url: None,
        }
    }
}

/// Bounded ring buffer of the last `LOG_RING_CAPACITY` stdout lines.
pub struct LogRing {
    lines: VecDeque<String>,
}

impl LogRing {
    fn new() -> Self {
        Self {
            lines: VecDeque::with_capacity(LOG_RING_CAPACITY),
        }
    }

    pub fn push(&mut self, line: String) {
        if self.lines.len() == LOG_RING_CAPACITY {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn last(&self, count: usize) -> Vec<String> {
        let skip = self.lines.len().saturating_sub(count);
        self.lines.iter().skip(skip).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_never_exceeds_capacity() {
        let mut ring = LogRing::new();
        for i in 0..(LOG_RING_CAPACITY + 50) {
            ring.push(format!("line {i}"));
        }
        assert_eq!(ring.lines.len(), LOG_RING_CAPACITY);
        assert_eq!(ring.lines.front().unwrap(), "line 50");
    }

    #[test]
    fn last_returns_most_recent_lines() {
        let mut ring = LogRing::new();
        for i in 0..10 {
            ring.push(format!("line {i}"));
        }
        let last3 = ring.last(3);
        assert_eq!(last3, vec!["line 7", "line 8", "line 9"]);
    }
}
