use std::collections::VecDeque;

use crate::domain::Notification;

/// Most-recent-first history of received notifications.
#[derive(Debug)]
pub struct NotificationBuffer {
    entries: VecDeque<Notification>,
    capacity: usize,
}

impl Default for NotificationBuffer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl NotificationBuffer {
    pub const DEFAULT_CAPACITY: usize = 50;

    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Records a notification, evicting the oldest beyond capacity.
    pub fn push(&mut self, notification: Notification) {
        self.entries.push_front(notification);
        self.entries.truncate(self.capacity);
    }

    #[must_use]
    pub fn latest(&self) -> Option<&Notification> {
        self.entries.front()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NotificationKind;

    fn notification(index: usize) -> Notification {
        Notification::new(NotificationKind::Created, format!("album {index}"))
    }

    #[test]
    fn test_most_recent_first() {
        let mut buffer = NotificationBuffer::default();
        buffer.push(notification(1));
        buffer.push(notification(2));

        assert_eq!(buffer.latest().unwrap().message, "album 2");
        let messages: Vec<_> = buffer.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, ["album 2", "album 1"]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut buffer = NotificationBuffer::default();
        for index in 0..120 {
            buffer.push(notification(index));
        }

        assert_eq!(buffer.len(), NotificationBuffer::DEFAULT_CAPACITY);
        assert_eq!(buffer.latest().unwrap().message, "album 119");
        assert_eq!(buffer.iter().last().unwrap().message, "album 70");
    }

    #[test]
    fn test_holds_every_entry_below_capacity() {
        for count in [0, 1, 49, 50, 51] {
            let mut buffer = NotificationBuffer::default();
            for index in 0..count {
                buffer.push(notification(index));
            }
            assert_eq!(buffer.len(), count.min(50));
        }
    }

    #[test]
    fn test_clear_resets_latest() {
        let mut buffer = NotificationBuffer::new(3);
        buffer.push(notification(1));

        buffer.clear();

        assert!(buffer.is_empty());
        assert!(buffer.latest().is_none());
    }
}
