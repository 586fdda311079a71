// Dashboard domain model
use super::alert::AlertItem;
use std::collections::VecDeque;

/// Id of the element that hosts the alert list.
pub const DASHBOARD_CONTAINER_ID: &str = "dashboard-container";

/// Rolling window of the most recent alerts, newest first.
#[derive(Debug, Clone)]
pub struct AlertWindow {
    capacity: usize,
    items: VecDeque<AlertItem>,
}

impl AlertWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            items: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    pub fn push(&mut self, item: AlertItem) {
        self.items.push_front(item);
        self.items.truncate(self.capacity);
    }

    pub fn to_vec(&self) -> Vec<AlertItem> {
        self.items.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first_and_bounded() {
        let mut window = AlertWindow::new(2);
        assert!(window.to_vec().is_empty());

        window.push(AlertItem::new("1", "a"));
        window.push(AlertItem::new("2", "b"));
        window.push(AlertItem::new("3", "c"));

        assert_eq!(
            window.to_vec(),
            vec![AlertItem::new("3", "c"), AlertItem::new("2", "b")]
        );
    }

    #[test]
    fn test_zero_capacity_keeps_latest() {
        let mut window = AlertWindow::new(0);
        window.push(AlertItem::new("1", "a"));
        window.push(AlertItem::new("2", "b"));
        assert_eq!(window.to_vec(), vec![AlertItem::new("2", "b")]);
    }
}
