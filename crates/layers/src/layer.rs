#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u64);

pub trait Layer {
    fn id(&self) -> LayerId;
}

/// Monotonic layer id source. Ids are never reused, so a late callback
/// naming an old layer can always be told apart from its replacement.
#[derive(Debug, Default, Clone)]
pub struct LayerIds {
    next: u64,
}

impl LayerIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> LayerId {
        self.next += 1;
        LayerId(self.next)
    }
}
