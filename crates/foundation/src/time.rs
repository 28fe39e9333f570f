/// Event-loop timestamp in milliseconds.
///
/// The origin is whatever clock the host uses (`Date.now()`, a test counter);
/// only differences are meaningful.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct Millis(pub f64);

impl Millis {
    pub const ZERO: Millis = Millis(0.0);

    pub fn after(self, delay_ms: f64) -> Self {
        Millis(self.0 + delay_ms.max(0.0))
    }

    pub fn since(self, earlier: Millis) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }

    pub fn is_at_or_after(self, deadline: Millis) -> bool {
        self.0 >= deadline.0
    }
}
