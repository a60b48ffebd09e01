use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Success,
    Trade,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventLogEntry {
    pub at: DateTime<Utc>,
    pub message: String,
    pub level: EventLevel,
}

/// Newest-first bounded event feed for the status surface.
pub struct EventLog {
    entries: VecDeque<EventLogEntry>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    pub fn push(&mut self, level: EventLevel, message: impl Into<String>) {
        self.entries.push_front(EventLogEntry {
            at: Utc::now(),
            message: message.into(),
            level,
        });
        if self.entries.len() > self.capacity {
            self.entries.pop_back();
        }
    }

    /// Up to `n` most recent entries, newest first.
    pub fn recent(&self, n: usize) -> Vec<EventLogEntry> {
        self.entries.iter().take(n).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first_ordering() {
        let mut log = EventLog::new(10);
        log.push(EventLevel::Info, "first");
        log.push(EventLevel::Trade, "second");

        let recent = log.recent(10);
        assert_eq!(recent[0].message, "second");
        assert_eq!(recent[1].message, "first");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut log = EventLog::new(3);
        for i in 0..5 {
            log.push(EventLevel::Info, format!("event {}", i));
        }

        assert_eq!(log.len(), 3);
        let recent = log.recent(10);
        assert_eq!(recent[0].message, "event 4");
        assert_eq!(recent[2].message, "event 2");
    }

    #[test]
    fn test_recent_truncates() {
        let mut log = EventLog::new(100);
        for i in 0..10 {
            log.push(EventLevel::Info, format!("event {}", i));
        }
        assert_eq!(log.recent(4).len(), 4);
    }
}
