use std::time::{Duration, Instant};

/// Debounced search input: only the last query typed within `delay` is sent.
#[derive(Debug)]
pub struct SearchBox {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

impl SearchBox {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record a keystroke. Restarts the debounce window.
    pub fn input(&mut self, query: &str, now: Instant) {
        self.pending = Some((query.trim().to_string(), now + self.delay));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// The query to send, once its window has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<String> {
        if self.deadline().is_some_and(|at| now >= at) {
            self.pending.take().map(|(query, _)| query)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_for_the_debounce_window() {
        let start = Instant::now();
        let mut search = SearchBox::new(Duration::from_millis(500));
        search.input("iss", start);

        assert_eq!(search.take_due(start + Duration::from_millis(499)), None);
        assert_eq!(
            search.take_due(start + Duration::from_millis(500)),
            Some("iss".to_string())
        );
        assert_eq!(search.take_due(start + Duration::from_secs(5)), None);
        assert_eq!(search.deadline(), None);
    }

    #[test]
    fn later_input_restarts_the_window() {
        let start = Instant::now();
        let mut search = SearchBox::new(Duration::from_millis(500));
        search.input("is", start);
        search.input(" iss ", start + Duration::from_millis(300));

        assert_eq!(search.take_due(start + Duration::from_millis(600)), None);
        assert_eq!(
            search.deadline(),
            Some(start + Duration::from_millis(800))
        );
        assert_eq!(
            search.take_due(start + Duration::from_millis(800)),
            Some("iss".to_string())
        );
    }
}
