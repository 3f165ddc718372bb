use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

/// Single transient notification slot. A new toast replaces the current one and
/// restarts the timer.
#[derive(Debug)]
pub struct ToastSlot {
    duration: Duration,
    current: Option<(String, Instant)>,
}

impl ToastSlot {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            current: None,
        }
    }

    pub fn show(&mut self, message: impl Into<String>, now: Instant) {
        self.current = Some((message.into(), now + self.duration));
    }

    pub fn message(&self, now: Instant) -> Option<&str> {
        match &self.current {
            Some((message, expires_at)) if now < *expires_at => Some(message.as_str()),
            _ => None,
        }
    }
}

impl Default for ToastSlot {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_expires() {
        let start = Instant::now();
        let mut toast = ToastSlot::default();
        toast.show("Frame copied to clipboard", start);

        assert_eq!(toast.message(start), Some("Frame copied to clipboard"));
        assert_eq!(toast.message(start + Duration::from_millis(2999)), Some("Frame copied to clipboard"));
        assert_eq!(toast.message(start + Duration::from_millis(3000)), None);
    }

    #[test]
    fn test_new_toast_restarts_timer() {
        let start = Instant::now();
        let mut toast = ToastSlot::default();
        toast.show("first", start);
        toast.show("second", start + Duration::from_secs(2));

        assert_eq!(toast.message(start + Duration::from_secs(4)), Some("second"));
    }
}
