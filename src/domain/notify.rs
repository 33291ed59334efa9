//! Toast-style notifications keyed by id

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

pub const TOAST_LIFETIME: Duration = Duration::from_secs(4);

#[derive(Debug, Clone)]
pub struct Toast {
    pub id: String,
    pub text: String,
    pub at: DateTime<Local>,
    since: Instant,
}

/// Visible notifications. Pushing an id that is already on screen updates the
/// existing toast instead of stacking a second one.
#[derive(Debug, Default)]
pub struct Notifications {
    toasts: Vec<Toast>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when a new toast was added, `false` when an existing one
    /// with the same id was refreshed.
    pub fn push(&mut self, id: impl Into<String>, text: impl Into<String>) -> bool {
        let id = id.into();
        let text = text.into();
        let now = Instant::now();
        if let Some(existing) = self.toasts.iter_mut().find(|t| t.id == id) {
            existing.text = text;
            existing.since = now;
            return false;
        }
        self.toasts.push(Toast {
            id,
            text,
            at: Local::now(),
            since: now,
        });
        true
    }

    pub fn expire(&mut self, lifetime: Duration) {
        self.toasts.retain(|t| t.since.elapsed() < lifetime);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_id_does_not_stack() {
        let mut n = Notifications::new();
        assert!(n.push("a", "first"));
        assert!(!n.push("a", "second"));
        assert!(n.push("b", "other"));
        assert_eq!(n.len(), 2);
        assert_eq!(n.iter().next().map(|t| t.text.as_str()), Some("second"));
    }

    #[test]
    fn test_expire_drops_old_toasts() {
        let mut n = Notifications::new();
        n.push("a", "hello");
        n.expire(TOAST_LIFETIME);
        assert_eq!(n.len(), 1);
        n.expire(Duration::ZERO);
        assert!(n.is_empty());
    }
}
