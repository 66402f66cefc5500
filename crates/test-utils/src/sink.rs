use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use exitd::exec::LineSink;

/// A sink that records every relayed line in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Lines whose text (after any prefix) ends with `suffix`.
    pub fn lines_ending_with(&self, suffix: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.ends_with(suffix))
            .collect()
    }

    /// Poll until at least `count` lines end with `suffix`.
    ///
    /// Returns `false` if that does not happen within `timeout`.
    pub async fn wait_for(&self, suffix: &str, count: usize, timeout: Duration) -> bool {
        let poll = async {
            while self.lines_ending_with(suffix).len() < count {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        };
        tokio::time::timeout(timeout, poll).await.is_ok()
    }
}

impl LineSink for MemorySink {
    fn write_line(&self, line: String) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        self.lines.lock().unwrap().push(line);
        Box::pin(std::future::ready(()))
    }
}
