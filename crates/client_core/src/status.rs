use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub positive: bool,
    pub reported_at: DateTime<Utc>,
}

/// Dismissible advisory messages, most recent first.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    messages: Vec<StatusMessage>,
}

impl StatusBoard {
    pub fn report(&mut self, text: impl Into<String>, positive: bool) {
        self.messages.insert(
            0,
            StatusMessage {
                text: text.into(),
                positive,
                reported_at: Utc::now(),
            },
        );
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.report(text, true);
    }

    pub fn failure(&mut self, text: impl Into<String>) {
        self.report(text, false);
    }

    pub fn dismiss(&mut self, position: usize) -> Option<StatusMessage> {
        (position < self.messages.len()).then(|| self.messages.remove(position))
    }

    pub fn messages(&self) -> &[StatusMessage] {
        &self.messages
    }

    pub fn latest(&self) -> Option<&StatusMessage> {
        self.messages.first()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
