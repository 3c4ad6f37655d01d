use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::chat::{ChatClient, ChatConfig, Command, Directory, Renderer, Session, ViewEvent};
use crate::transport::{ApiClient, ConnState, MessageLine, Mode, Target, WsConnector};

#[derive(Debug, Parser)]
#[command(name = "chat-client", about = "Terminal client for the chat server")]
pub struct Args {
    /// Server base url, e.g. http://localhost:3000 (overrides the config file)
    #[arg(long)]
    pub server: Option<String>,
    #[arg(long, short)]
    pub username: String,
    #[arg(long, env = "CHAT_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// Create the account before logging in
    #[arg(long)]
    pub register: bool,
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn run(args: Args) -> Result<()> {
    let mut config = ChatConfig::load(args.config.as_deref()).context("failed to load config")?;
    if let Some(server) = args.server {
        config.server_url = server;
    }

    let api = ApiClient::new(&config.server_url).context("invalid server url")?;
    if args.register {
        api.register(&args.username, &args.password)
            .await
            .context("registration failed")?;
        info!("registered {}", args.username);
    }
    let login = api
        .login(&args.username, &args.password)
        .await
        .context("login failed")?;
    let session = Session::new(login.username, login.token);
    let api = api.with_token(session.auth_token());

    let mut directory = Directory::new();
    directory.apply_channels(api.channels().await.context("failed to list channels")?);
    directory.apply_members(
        api.members().await.context("failed to list members")?,
        session.user_id(),
    );

    let (commands, commands_rx) = mpsc::unbounded_channel();
    if let Some(channel) = directory.first_channel() {
        let _ = commands.send(Command::Switch {
            target: Target::Channel(channel.id),
            display_name: channel.name.clone(),
        });
    }
    let input = tokio::spawn(read_input(InputHandler::new(directory), commands));

    let client = ChatClient::new(
        &config,
        Box::new(WsConnector),
        Arc::new(api),
        Box::new(TerminalRenderer::new(std::io::stdout())),
    );
    let result = client.run(session, commands_rx).await;
    input.abort();
    result.context("chat session failed")
}

async fn read_input(mut handler: InputHandler, commands: mpsc::UnboundedSender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let mut stdout = std::io::stdout();
                for command in handler.handle(&line, &mut stdout) {
                    if commands.send(command).is_err() {
                        return;
                    }
                }
            }
            Ok(None) => break,
            Err(err) => {
                warn!("stdin read failed: {err}");
                break;
            }
        }
    }
    let _ = commands.send(Command::Logout);
}

#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Empty,
    Join(String),
    Direct(String),
    Mute,
    Channels,
    Members,
    Quit,
    /// A line ending in `\`: more of the same message follows.
    Draft(String),
    Message(String),
    Unknown(String),
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Input::Empty;
    }

    if let Some(command) = line.strip_prefix('/') {
        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };
        return match (name, arg) {
            ("join", arg) if !arg.is_empty() => Input::Join(arg.to_string()),
            ("dm", arg) if !arg.is_empty() => Input::Direct(arg.to_string()),
            ("mute", _) => Input::Mute,
            ("channels", _) => Input::Channels,
            ("members", _) => Input::Members,
            ("quit", _) => Input::Quit,
            _ => Input::Unknown(line.to_string()),
        };
    }

    match line.strip_suffix('\\') {
        Some(draft) => Input::Draft(draft.to_string()),
        None => Input::Message(line.to_string()),
    }
}

/// Turns typed lines into commands, keeping multi-line drafts.
pub struct InputHandler {
    directory: Directory,
    draft: Vec<String>,
}

impl InputHandler {
    pub fn new(directory: Directory) -> Self {
        Self {
            directory,
            draft: Vec::new(),
        }
    }

    pub fn handle(&mut self, line: &str, out: &mut impl Write) -> Vec<Command> {
        match parse_input(line) {
            Input::Empty => Vec::new(),
            Input::Join(query) => match self.directory.resolve_channel(&query) {
                Some((target, display_name)) => vec![Command::Switch {
                    target,
                    display_name,
                }],
                None => {
                    let _ = writeln!(out, "* no channel {query}");
                    Vec::new()
                }
            },
            Input::Direct(query) => match self.directory.resolve_member(&query) {
                Some((target, display_name)) => vec![Command::Switch {
                    target,
                    display_name,
                }],
                None => {
                    let _ = writeln!(out, "* no member {query}");
                    Vec::new()
                }
            },
            Input::Mute => vec![Command::ToggleMute],
            Input::Channels => {
                for channel in self.directory.channels() {
                    let _ = writeln!(out, "  #{} ({})", channel.name, channel.id);
                }
                Vec::new()
            }
            Input::Members => {
                for member in self.directory.members() {
                    let _ = writeln!(out, "  @{}", member.username);
                }
                Vec::new()
            }
            Input::Quit => vec![Command::Logout],
            Input::Draft(text) => {
                self.draft.push(text);
                vec![Command::Typing]
            }
            Input::Message(text) => {
                self.draft.push(text);
                let content = self.draft.join("\n");
                self.draft.clear();
                vec![Command::Send(content)]
            }
            Input::Unknown(text) => {
                let _ = writeln!(
                    out,
                    "* unknown command {text} (try /join, /dm, /mute, /channels, /members, /quit)"
                );
                Vec::new()
            }
        }
    }
}

/// Plain-text renderer; acknowledgments ring the terminal bell.
pub struct TerminalRenderer<W> {
    out: W,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, line: &MessageLine) {
        let _ = writeln!(self.out, "{}: {}", line.author, line.content);
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn render(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::ConnectionState(state) => {
                let text = match state {
                    ConnState::Connecting => "connecting...",
                    ConnState::Open => "connected",
                    ConnState::Closed => "disconnected",
                };
                let _ = writeln!(self.out, "* {text}");
            }
            ViewEvent::ContextChanged(context) => {
                let sigil = match context.mode() {
                    Mode::Channel => '#',
                    Mode::Direct => '@',
                };
                let _ = writeln!(self.out, "\n== {sigil}{} ==", context.display_name());
            }
            ViewEvent::HistoryLoaded(lines) => {
                if lines.is_empty() {
                    let _ = writeln!(self.out, "(no messages yet)");
                }
                for line in &lines {
                    self.line(line);
                }
            }
            ViewEvent::MessageAppended(line) => self.line(&line),
            ViewEvent::TypingShown { who } => {
                let _ = writeln!(self.out, "* {who} is typing...");
            }
            ViewEvent::TypingCleared => {}
            ViewEvent::Feedback(acknowledgment) => {
                log::debug!("acknowledgment: {acknowledgment:?}");
                let _ = write!(self.out, "\x07");
            }
            ViewEvent::MuteChanged(muted) => {
                let text = if muted { "sounds off" } else { "sounds on" };
                let _ = writeln!(self.out, "* {text}");
            }
            ViewEvent::SessionEnded => {
                let _ = writeln!(self.out, "* logged out");
            }
        }
        let _ = self.out.flush();
    }
}
