use std::time::Duration;

use tokio::time::Instant;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Indicator {
    who: String,
    expires_at: Instant,
}

/// Outbound typing debounce plus the single inbound "who is typing" indicator.
#[derive(Debug)]
pub struct TypingCoordinator {
    debounce: Duration,
    expiry: Duration,
    last_sent: Option<Instant>,
    indicator: Option<Indicator>,
}

impl TypingCoordinator {
    pub fn new(debounce: Duration, expiry: Duration) -> Self {
        Self {
            debounce,
            expiry,
            last_sent: None,
            indicator: None,
        }
    }

    /// True when a typing signal may go out now; claims the slot if so.
    /// The window is shared by all contexts.
    pub fn try_claim_send(&mut self, now: Instant) -> bool {
        let due = match self.last_sent {
            None => true,
            Some(last) => now.saturating_duration_since(last) > self.debounce,
        };
        if due {
            self.last_sent = Some(now);
        }
        due
    }

    /// Shows `who` as typing and re-arms the expiry. Last writer wins.
    pub fn show(&mut self, who: &str, now: Instant) {
        self.indicator = Some(Indicator {
            who: who.to_string(),
            expires_at: now + self.expiry,
        });
    }

    /// Removes the indicator and its pending expiry. Returns whether one was visible.
    pub fn clear(&mut self) -> bool {
        self.indicator.take().is_some()
    }

    /// Clears the indicator if its expiry has passed. Returns whether it was cleared.
    pub fn expire(&mut self, now: Instant) -> bool {
        match &self.indicator {
            Some(indicator) if now >= indicator.expires_at => {
                self.indicator = None;
                true
            }
            _ => false,
        }
    }

    pub fn visible(&self) -> Option<&str> {
        self.indicator.as_ref().map(|indicator| indicator.who.as_str())
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.indicator.as_ref().map(|indicator| indicator.expires_at)
    }

    pub fn reset(&mut self) {
        self.last_sent = None;
        self.indicator = None;
    }
}
