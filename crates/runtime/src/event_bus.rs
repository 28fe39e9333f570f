/// How loudly a notice should reach the user.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeLevel {
    Info,
    /// Soft error; the system already corrected itself.
    Warning,
    /// Blocking notification (the web front end shows `alert`).
    Alert,
}

/// User-facing notification.
///
/// Kept separate from diagnostics logging so handlers can be tested on what
/// the user would actually be told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub seq: u64,
    pub level: NoticeLevel,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    next_seq: u64,
    events: Vec<Notice>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, level: NoticeLevel, kind: &'static str, message: impl Into<String>) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.events.push(Notice {
            seq,
            level,
            kind,
            message: message.into(),
        });
    }

    pub fn warn(&mut self, kind: &'static str, message: impl Into<String>) {
        self.emit(NoticeLevel::Warning, kind, message);
    }

    pub fn alert(&mut self, kind: &'static str, message: impl Into<String>) {
        self.emit(NoticeLevel::Alert, kind, message);
    }

    pub fn events(&self) -> &[Notice] {
        &self.events
    }

    pub fn last(&self) -> Option<&Notice> {
        self.events.last()
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.events)
    }
}
