use log::{debug, trace, warn};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::chat::classify::{classify, Relevance};
use crate::chat::config::ChatConfig;
use crate::chat::connection::ConnectionManager;
use crate::chat::context::{ContextTracker, ConversationContext, HistoryRequest};
use crate::chat::events::{InboundEvent, OutboundFrame, ViewEvent};
use crate::chat::feedback;
use crate::chat::session::Session;
use crate::chat::typing::TypingCoordinator;
use crate::transport::errors::TransportError;
use crate::transport::link::{ConnectRequest, Connector, LinkEvent};
use crate::transport::types::{ConnState, MessageLine, Target};

/// The realtime sync core for one client: session, link, active context, typing and
/// feedback. Purely reactive; callers feed it commands, link events and the current time,
/// and drain [`ViewEvent`]s with [`ChatEngine::take_events`].
pub struct ChatEngine {
    server_url: String,
    session: Option<Session>,
    connection: ConnectionManager,
    context: ContextTracker,
    typing: TypingCoordinator,
    events: Vec<ViewEvent>,
}

impl ChatEngine {
    pub fn new(
        config: &ChatConfig,
        connector: Box<dyn Connector>,
        link_events: mpsc::UnboundedSender<LinkEvent>,
    ) -> Self {
        Self {
            server_url: config.server_url.clone(),
            session: None,
            connection: ConnectionManager::new(connector, link_events, config.reconnect_delay),
            context: ContextTracker::new(),
            typing: TypingCoordinator::new(config.typing_debounce, config.typing_expiry),
            events: Vec::new(),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn context(&self) -> Option<&ConversationContext> {
        self.context.active()
    }

    pub fn conn_state(&self) -> ConnState {
        self.connection.conn_state()
    }

    pub fn typing_indicator(&self) -> Option<&str> {
        self.typing.visible()
    }

    pub fn take_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    /// Starts a session and connects with its token.
    pub fn login(&mut self, session: Session) -> Result<(), TransportError> {
        if session.user_id().trim().is_empty() {
            return Err(TransportError::InvalidConfig(
                "user id is required".to_string(),
            ));
        }
        let request = ConnectRequest::new(&self.server_url, session.auth_token())?;
        if self.session.is_some() {
            self.logout();
        }
        self.session = Some(session);
        self.connection.connect(request);
        self.collect_transitions();
        Ok(())
    }

    /// Ends the session: link torn down without reconnect, all derived state dropped.
    pub fn logout(&mut self) {
        self.connection.teardown();
        self.collect_transitions();
        self.context.reset();
        self.typing.reset();
        if self.session.take().is_some() {
            self.events.push(ViewEvent::SessionEnded);
        }
    }

    /// Makes `target` the active conversation. The caller loads history for the returned
    /// request and hands it back through [`ChatEngine::apply_history`].
    pub fn switch_to(
        &mut self,
        target: Target,
        display_name: impl Into<String>,
    ) -> Option<HistoryRequest> {
        if self.session.is_none() {
            warn!("switch to {target} ignored without a session");
            return None;
        }
        self.typing.clear();
        let context = ConversationContext::new(target, display_name);
        let request = self.context.switch_to(context.clone());
        debug!("switched to {} (ticket {})", context.target(), request.ticket);
        self.events.push(ViewEvent::ContextChanged(context));
        Some(request)
    }

    /// Renders history for `ticket` if it is still the current load. A failed load renders
    /// as empty so live messages held during the load are not lost.
    pub fn apply_history(
        &mut self,
        ticket: u64,
        history: Result<Vec<MessageLine>, TransportError>,
    ) {
        let Some(held) = self.context.finish_load(ticket) else {
            return;
        };
        let history = history.unwrap_or_else(|err| {
            warn!("history load failed: {err}");
            Vec::new()
        });
        self.events.push(ViewEvent::HistoryLoaded(history));
        for line in held {
            self.render_line(line);
        }
    }

    pub fn handle_link_event(&mut self, event: LinkEvent, now: Instant) {
        let inbound = self.connection.handle(event, now);
        self.collect_transitions();
        if let Some(inbound) = inbound {
            self.dispatch(inbound, now);
        }
    }

    /// Sends a typing ping for the active context, at most once per debounce window.
    pub fn notify_typing(&mut self, now: Instant) -> bool {
        let Some(target) = self.active_target() else {
            return false;
        };
        if !self.typing.try_claim_send(now) {
            return false;
        }
        self.connection.send(&OutboundFrame::typing(&target))
    }

    pub fn send_message(&mut self, content: String) -> bool {
        if content.trim().is_empty() {
            return false;
        }
        let Some(target) = self.active_target() else {
            return false;
        };
        self.connection.send(&OutboundFrame::message(&target, content))
    }

    pub fn toggle_mute(&mut self) -> Option<bool> {
        let muted = self.session.as_mut()?.toggle_mute();
        self.events.push(ViewEvent::MuteChanged(muted));
        Some(muted)
    }

    /// Earliest moment [`ChatEngine::poll_timers`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.connection.reconnect_at(), self.typing.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn poll_timers(&mut self, now: Instant) {
        self.connection.poll(now);
        self.collect_transitions();
        if self.typing.expire(now) {
            self.events.push(ViewEvent::TypingCleared);
        }
    }

    fn dispatch(&mut self, event: InboundEvent, now: Instant) {
        let Some(session) = &self.session else {
            return;
        };
        match classify(&event, self.context.active(), session.user_id()) {
            Relevance::ChannelMatch | Relevance::DirectMatch => {
                let line = match event {
                    InboundEvent::ChannelMessage {
                        author, content, ..
                    } => MessageLine::new(author, content),
                    InboundEvent::DirectMessage {
                        sender, content, ..
                    } => MessageLine::new(sender, content),
                    InboundEvent::Typing { .. } => return,
                };
                if self.typing.clear() {
                    self.events.push(ViewEvent::TypingCleared);
                }
                if let Some(line) = self.context.defer(line) {
                    self.render_line(line);
                }
            }
            Relevance::TypingMatch => {
                let who = event.author().to_string();
                self.typing.show(&who, now);
                self.events.push(ViewEvent::TypingShown { who });
            }
            Relevance::Ignored => trace!("ignored {event:?}"),
        }
    }

    /// Appends `line`, then plays its sound. Mute is read at render time, so a line
    /// held through a history load follows the mute state of the moment it shows.
    fn render_line(&mut self, line: MessageLine) {
        let acknowledgment = self
            .session
            .as_ref()
            .and_then(|session| feedback::acknowledgment(&line.author, session));
        self.events.push(ViewEvent::MessageAppended(line));
        if let Some(acknowledgment) = acknowledgment {
            self.events.push(ViewEvent::Feedback(acknowledgment));
        }
    }

    fn active_target(&self) -> Option<Target> {
        self.session.as_ref()?;
        self.context.active().map(|context| context.target().clone())
    }

    fn collect_transitions(&mut self) {
        self.events.extend(
            self.connection
                .take_transitions()
                .into_iter()
                .map(ViewEvent::ConnectionState),
        );
    }
}
