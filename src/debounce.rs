use std::time::Duration;
use tokio::time::{Instant, sleep_until};

/// Holds back a rapidly changing value until it has stopped changing for `window`.
///
/// The struct only does bookkeeping: callers push raw values with the instant they
/// arrived and poll for the settled value. [`Debounce::quiesced`] lets an event loop
/// sleep until the next possible emission. Dropping a `Debounce` discards whatever
/// was still pending.
#[derive(Debug)]
pub struct Debounce<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    pub fn new(window: Duration) -> Self {
        Debounce { window, pending: None }
    }

    /// Replaces the pending value and restarts the quiescence window.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, changed_at)| *changed_at + self.window)
    }

    /// Takes the pending value once the window has elapsed since its last change.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline() {
            Some(deadline) if now >= deadline => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Completes at the current deadline, or never when nothing is pending.
    pub async fn quiesced(&self) {
        match self.deadline() {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(800);

    #[test]
    fn nothing_is_emitted_before_the_window_elapses() {
        let start = Instant::now();
        let mut debounce = Debounce::new(WINDOW);

        debounce.push("esp", start);

        assert_eq!(debounce.poll(start + Duration::from_millis(799)), None);
        assert!(debounce.deadline().is_some());
    }

    #[test]
    fn emits_the_settled_value_once() {
        let start = Instant::now();
        let mut debounce = Debounce::new(WINDOW);

        debounce.push("esp", start);

        assert_eq!(debounce.poll(start + WINDOW), Some("esp"));
        assert_eq!(debounce.poll(start + WINDOW * 2), None);
    }

    #[test]
    fn every_push_restarts_the_window() {
        let start = Instant::now();
        let mut debounce = Debounce::new(WINDOW);

        debounce.push("e", start);
        debounce.push("es", start + Duration::from_millis(500));
        debounce.push("esp", start + Duration::from_millis(1000));

        assert_eq!(debounce.poll(start + Duration::from_millis(1500)), None);
        assert_eq!(debounce.deadline(), Some(start + Duration::from_millis(1800)));
        assert_eq!(debounce.poll(start + Duration::from_millis(1800)), Some("esp"));
    }

    #[test]
    fn cancel_drops_the_pending_value() {
        let start = Instant::now();
        let mut debounce = Debounce::new(WINDOW);

        debounce.push("esp", start);
        debounce.cancel();

        assert_eq!(debounce.poll(start + WINDOW), None);
        assert_eq!(debounce.deadline(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn quiesced_wakes_at_the_deadline() {
        let start = Instant::now();
        let mut debounce = Debounce::new(WINDOW);
        debounce.push("esp", start);

        debounce.quiesced().await;

        assert!(Instant::now() >= start + WINDOW);
        assert_eq!(debounce.poll(Instant::now()), Some("esp"));
    }

    #[tokio::test(start_paused = true)]
    async fn quiesced_never_completes_without_a_pending_value() {
        let debounce = Debounce::<&str>::new(WINDOW);

        let result = tokio::time::timeout(Duration::from_secs(60), debounce.quiesced()).await;

        assert!(result.is_err());
    }
}
