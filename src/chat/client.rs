use std::sync::Arc;

use log::{debug, info};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use crate::chat::config::ChatConfig;
use crate::chat::context::HistoryRequest;
use crate::chat::engine::ChatEngine;
use crate::chat::events::ViewEvent;
use crate::chat::session::Session;
use crate::transport::api::HistorySource;
use crate::transport::errors::TransportError;
use crate::transport::link::{Connector, LinkEvent};
use crate::transport::types::{MessageLine, Target};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Switch { target: Target, display_name: String },
    Typing,
    Send(String),
    ToggleMute,
    Logout,
}

/// Receives view events in order. Must not block.
pub trait Renderer: Send {
    fn render(&mut self, event: ViewEvent);
}

struct HistoryReply {
    ticket: u64,
    result: Result<Vec<MessageLine>, TransportError>,
}

/// Single-task dispatch loop around a [`ChatEngine`].
pub struct ChatClient {
    engine: ChatEngine,
    link_events: mpsc::UnboundedReceiver<LinkEvent>,
    history: Arc<dyn HistorySource>,
    history_tx: mpsc::UnboundedSender<HistoryReply>,
    history_rx: mpsc::UnboundedReceiver<HistoryReply>,
    renderer: Box<dyn Renderer>,
}

impl ChatClient {
    pub fn new(
        config: &ChatConfig,
        connector: Box<dyn Connector>,
        history: Arc<dyn HistorySource>,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        let (link_tx, link_rx) = mpsc::unbounded_channel();
        let (history_tx, history_rx) = mpsc::unbounded_channel();
        Self {
            engine: ChatEngine::new(config, connector, link_tx),
            link_events: link_rx,
            history,
            history_tx,
            history_rx,
            renderer,
        }
    }

    /// Runs until logout or until the command channel closes.
    pub async fn run(
        mut self,
        session: Session,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) -> Result<(), TransportError> {
        info!("session started for {}", session.user_id());
        self.engine.login(session)?;
        self.flush();

        let timer = sleep_until(Instant::now());
        tokio::pin!(timer);

        loop {
            let deadline = self.engine.next_deadline();
            if let Some(deadline) = deadline {
                timer.as_mut().reset(deadline);
            }

            // Link events before the timer: typing that lands on the expiry instant re-arms.
            tokio::select! {
                biased;

                Some(event) = self.link_events.recv() => {
                    self.engine.handle_link_event(event, Instant::now());
                }

                Some(reply) = self.history_rx.recv() => {
                    self.engine.apply_history(reply.ticket, reply.result);
                }

                command = commands.recv() => {
                    let running = self.apply(command.unwrap_or(Command::Logout));
                    if !running {
                        self.flush();
                        break;
                    }
                }

                () = &mut timer, if deadline.is_some() => {
                    self.engine.poll_timers(Instant::now());
                }
            }

            self.flush();
        }

        info!("session ended");
        Ok(())
    }

    /// Returns `false` once the session has ended.
    fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Switch {
                target,
                display_name,
            } => {
                if let Some(request) = self.engine.switch_to(target, display_name) {
                    self.load_history(request);
                }
            }
            Command::Typing => {
                self.engine.notify_typing(Instant::now());
            }
            Command::Send(content) => {
                self.engine.send_message(content);
            }
            Command::ToggleMute => {
                self.engine.toggle_mute();
            }
            Command::Logout => {
                self.engine.logout();
                return false;
            }
        }
        true
    }

    /// Loads history off the loop; the reply is matched against the ticket on arrival.
    fn load_history(&self, request: HistoryRequest) {
        let history = Arc::clone(&self.history);
        let replies = self.history_tx.clone();
        debug!("loading history for {} (ticket {})", request.target, request.ticket);
        tokio::spawn(async move {
            let result = history.fetch(&request.target).await;
            let _ = replies.send(HistoryReply {
                ticket: request.ticket,
                result,
            });
        });
    }

    fn flush(&mut self) {
        for event in self.engine.take_events() {
            self.renderer.render(event);
        }
    }
}
