use log::debug;

use crate::transport::types::{MessageLine, Mode, Target};

/// The conversation being viewed. Replaced as a whole, never edited in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationContext {
    target: Target,
    display_name: String,
}

impl ConversationContext {
    pub fn new(target: Target, display_name: impl Into<String>) -> Self {
        Self {
            target,
            display_name: display_name.into(),
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn mode(&self) -> Mode {
        self.target.mode()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// Issued by a switch; the history reply must present the same ticket to be rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRequest {
    pub ticket: u64,
    pub target: Target,
}

/// Tracks the active context and which history load is still wanted.
#[derive(Debug, Default)]
pub struct ContextTracker {
    active: Option<ConversationContext>,
    generation: u64,
    loading: bool,
    held: Vec<MessageLine>,
}

impl ContextTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ConversationContext> {
        self.active.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Replaces the active context. Any earlier ticket becomes stale, even when the
    /// target is the same one.
    pub fn switch_to(&mut self, context: ConversationContext) -> HistoryRequest {
        self.generation += 1;
        self.loading = true;
        self.held.clear();
        let target = context.target().clone();
        self.active = Some(context);
        HistoryRequest {
            ticket: self.generation,
            target,
        }
    }

    /// Ends the load for `ticket`, returning live lines that arrived meanwhile.
    /// `None` means the reply is stale and must be dropped.
    pub fn finish_load(&mut self, ticket: u64) -> Option<Vec<MessageLine>> {
        if ticket != self.generation || !self.loading {
            debug!(
                "dropping stale history (ticket {ticket}, current {})",
                self.generation
            );
            return None;
        }
        self.loading = false;
        Some(std::mem::take(&mut self.held))
    }

    /// Holds `line` back while history is loading, otherwise hands it back to render now.
    /// A held line is dropped if the context changes first.
    pub fn defer(&mut self, line: MessageLine) -> Option<MessageLine> {
        if self.loading {
            self.held.push(line);
            None
        } else {
            Some(line)
        }
    }

    pub fn reset(&mut self) {
        self.generation += 1;
        self.active = None;
        self.loading = false;
        self.held.clear();
    }
}
