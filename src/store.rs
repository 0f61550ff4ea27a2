use std::collections::VecDeque;
use tokio::sync::RwLock;

use crate::models::AlertRecord;

/// Bounded, most-recent-first buffer of alert records.
///
/// Lives for the process only; every fresh client starts empty.
pub struct NotificationStore {
    capacity: usize,
    buffer: RwLock<VecDeque<AlertRecord>>,
}

impl NotificationStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buffer: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Insert at the head, evicting from the tail past capacity.
    /// Identical records are kept as separate entries.
    pub async fn push(&self, record: AlertRecord) {
        let mut buf = self.buffer.write().await;
        buf.push_front(record);
        buf.truncate(self.capacity);
    }

    pub async fn snapshot(&self) -> Vec<AlertRecord> {
        self.buffer.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.buffer.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.buffer.read().await.is_empty()
    }
}
