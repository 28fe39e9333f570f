use foundation::time::Millis;

/// One cancellable pending value.
///
/// Each `push` replaces whatever was pending and restarts the delay, so a
/// burst of updates yields exactly one value once the burst settles.
/// The owner drives it by calling [`Debounced::poll`] from its timer
/// callback; stale timer callbacks simply find nothing due.
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    delay_ms: f64,
    pending: Option<(Millis, T)>,
}

impl<T> Debounced<T> {
    pub fn new(delay_ms: f64) -> Self {
        Self {
            delay_ms: delay_ms.max(0.0),
            pending: None,
        }
    }

    pub fn delay_ms(&self) -> f64 {
        self.delay_ms
    }

    /// Schedules `value`, replacing any pending one. Returns the new deadline.
    pub fn push(&mut self, value: T, now: Millis) -> Millis {
        let deadline = now.after(self.delay_ms);
        self.pending = Some((deadline, value));
        deadline
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, v)| v)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.pending.as_ref().map(|(d, _)| *d)
    }

    /// Takes the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Millis) -> Option<T> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|(deadline, _)| now.is_at_or_after(*deadline));
        if due { self.cancel() } else { None }
    }
}
