//! User-facing warnings and errors raised while processing records.
//!
//! Record-level problems never abort a fetch. They are reported to a
//! [`MessageSink`] and the offending record is skipped.

use parking_lot::Mutex;

/// Trait for collecting record-level messages.
pub trait MessageSink: Send + Sync {
    /// Record a warning (skipped record with an unknown or unsupported asset).
    fn add_warning(&self, message: String);

    /// Record an error (skipped record with malformed data).
    fn add_error(&self, message: String);
}

/// In-memory sink that queues messages until they are consumed.
///
/// Every message is also logged.
#[derive(Debug, Default)]
pub struct MessageAggregator {
    warnings: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl MessageAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain queued warnings.
    pub fn consume_warnings(&self) -> Vec<String> {
        std::mem::take(&mut *self.warnings.lock())
    }

    /// Drain queued errors.
    pub fn consume_errors(&self) -> Vec<String> {
        std::mem::take(&mut *self.errors.lock())
    }

    /// Number of queued warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.lock().len()
    }

    /// Number of queued errors.
    pub fn error_count(&self) -> usize {
        self.errors.lock().len()
    }
}

impl MessageSink for MessageAggregator {
    fn add_warning(&self, message: String) {
        tracing::warn!(message = %message, "[MESSAGE:WARNING]");
        self.warnings.lock().push(message);
    }

    fn add_error(&self, message: String) {
        tracing::error!(message = %message, "[MESSAGE:ERROR]");
        self.errors.lock().push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_consume_drains() {
        let aggregator = MessageAggregator::new();
        aggregator.add_warning("w1".to_string());
        aggregator.add_error("e1".to_string());
        aggregator.add_error("e2".to_string());

        assert_eq!(aggregator.warning_count(), 1);
        assert_eq!(aggregator.consume_errors(), vec!["e1", "e2"]);
        assert_eq!(aggregator.consume_warnings(), vec!["w1"]);
        assert!(aggregator.consume_errors().is_empty());
        assert_eq!(aggregator.error_count(), 0);
    }

    #[test]
    fn test_shared_across_threads() {
        let aggregator = Arc::new(MessageAggregator::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let sink: Arc<dyn MessageSink> = aggregator.clone();
                std::thread::spawn(move || sink.add_warning(format!("warning {i}")))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(aggregator.consume_warnings().len(), 4);
    }
}
