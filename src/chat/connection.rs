use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::chat::events::{InboundEvent, OutboundFrame};
use crate::transport::link::{ConnectRequest, Connector, LinkEvent, LinkHandle};
use crate::transport::types::ConnState;

/// Owns the single duplex link: opening it, reconnecting after drops, tearing it down.
///
/// Each open is numbered. Link events carry that number and anything from an older
/// attempt is dropped, so a torn-down link can never schedule a reconnect.
pub struct ConnectionManager {
    connector: Box<dyn Connector>,
    link_events: mpsc::UnboundedSender<LinkEvent>,
    reconnect_delay: Duration,
    conn_state: ConnState,
    attempt: u64,
    link: Option<LinkHandle>,
    request: Option<ConnectRequest>,
    reconnect_at: Option<Instant>,
    transitions: Vec<ConnState>,
}

impl ConnectionManager {
    pub fn new(
        connector: Box<dyn Connector>,
        link_events: mpsc::UnboundedSender<LinkEvent>,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            connector,
            link_events,
            reconnect_delay,
            conn_state: ConnState::Closed,
            attempt: 0,
            link: None,
            request: None,
            reconnect_at: None,
            transitions: Vec::new(),
        }
    }

    pub fn conn_state(&self) -> ConnState {
        self.conn_state
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn reconnect_at(&self) -> Option<Instant> {
        self.reconnect_at
    }

    /// State changes since the last call, oldest first.
    pub fn take_transitions(&mut self) -> Vec<ConnState> {
        std::mem::take(&mut self.transitions)
    }

    /// Opens a link unless one is already connecting or open. A pending reconnect is
    /// replaced by this attempt.
    pub fn connect(&mut self, request: ConnectRequest) {
        if self.conn_state != ConnState::Closed {
            debug!("connect ignored, link is {:?}", self.conn_state);
            return;
        }
        self.request = Some(request);
        self.reconnect_at = None;
        self.open();
    }

    /// Fire-and-forget. Frames are dropped unless the link is open.
    pub fn send(&mut self, frame: &OutboundFrame) -> bool {
        if self.conn_state != ConnState::Open {
            debug!("dropping outbound frame while {:?}", self.conn_state);
            return false;
        }
        let Some(link) = &self.link else {
            return false;
        };
        match serde_json::to_string(frame) {
            Ok(text) => link.send(text),
            Err(err) => {
                warn!("failed to encode outbound frame: {err}");
                false
            }
        }
    }

    /// Applies a link event. Returns the decoded inbound event for frames of the current link.
    pub fn handle(&mut self, event: LinkEvent, now: Instant) -> Option<InboundEvent> {
        if event.attempt() != self.attempt || self.link.is_none() {
            debug!(
                "ignoring event from link {} (current {})",
                event.attempt(),
                self.attempt
            );
            return None;
        }

        match event {
            LinkEvent::Opened { attempt } => {
                info!("link {attempt} open");
                self.set_conn_state(ConnState::Open);
                None
            }
            LinkEvent::Frame { text, .. } => match InboundEvent::decode(&text) {
                Ok(event) => Some(event),
                Err(err) => {
                    warn!("dropping inbound frame: {err}");
                    None
                }
            },
            LinkEvent::Closed { attempt } => {
                self.link = None;
                self.set_conn_state(ConnState::Closed);
                let at = now + self.reconnect_delay;
                info!(
                    "link {attempt} closed, reconnecting in {} ms",
                    self.reconnect_delay.as_millis()
                );
                self.reconnect_at = Some(at);
                None
            }
        }
    }

    /// Runs the scheduled reconnect once it is due.
    pub fn poll(&mut self, now: Instant) {
        match self.reconnect_at {
            Some(at) if now >= at => {
                self.reconnect_at = None;
                if self.conn_state == ConnState::Closed && self.request.is_some() {
                    self.open();
                }
            }
            _ => {}
        }
    }

    /// Closes the link for good: no reconnect, and late events from it are ignored.
    /// Safe to call repeatedly.
    pub fn teardown(&mut self) {
        self.attempt += 1;
        self.link = None;
        self.request = None;
        self.reconnect_at = None;
        if self.conn_state != ConnState::Closed {
            self.set_conn_state(ConnState::Closed);
        }
    }

    fn open(&mut self) {
        let Some(request) = self.request.clone() else {
            return;
        };
        self.attempt += 1;
        info!("connect attempt {} to {request:?}", self.attempt);
        self.set_conn_state(ConnState::Connecting);
        let link = self
            .connector
            .open(request, self.attempt, self.link_events.clone());
        self.link = Some(link);
    }

    fn set_conn_state(&mut self, next: ConnState) {
        self.conn_state = next;
        self.transitions.push(next);
    }
}
