use std::fmt;

use serde::Deserialize;

pub type ChannelId = i64;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Member {
    pub username: String,
}

/// One rendered line of a conversation, from history or from the live link.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MessageLine {
    #[serde(rename = "username", alias = "sender")]
    pub author: String,
    pub content: String,
}

impl MessageLine {
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            content: content.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Channel,
    Direct,
}

/// Mode and target id in one value so they can never be updated separately.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Channel(ChannelId),
    Direct(String),
}

impl Target {
    pub fn mode(&self) -> Mode {
        match self {
            Target::Channel(_) => Mode::Channel,
            Target::Direct(_) => Mode::Direct,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Channel(id) => write!(f, "channel {id}"),
            Target::Direct(user) => write!(f, "direct {user}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnState {
    Connecting,
    Open,
    Closed,
}
