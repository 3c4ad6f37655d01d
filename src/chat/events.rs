use serde::{Deserialize, Serialize};

use crate::chat::context::ConversationContext;
use crate::chat::feedback::Acknowledgment;
use crate::transport::errors::MalformedEvent;
use crate::transport::types::{ChannelId, ConnState, MessageLine, Target};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypingScope {
    Channel(ChannelId),
    /// Direct typing names the counterpart who is composing.
    Direct(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundEvent {
    ChannelMessage {
        channel_id: ChannelId,
        author: String,
        content: String,
    },
    DirectMessage {
        sender: String,
        receiver: String,
        content: String,
    },
    Typing {
        who: String,
        scope: TypingScope,
    },
}

impl InboundEvent {
    pub fn decode(text: &str) -> Result<Self, MalformedEvent> {
        let wire: WireEvent =
            serde_json::from_str(text).map_err(|err| MalformedEvent(err.to_string()))?;
        wire.try_into()
    }

    /// Who wrote the message, or who is typing.
    pub fn author(&self) -> &str {
        match self {
            InboundEvent::ChannelMessage { author, .. } => author,
            InboundEvent::DirectMessage { sender, .. } => sender,
            InboundEvent::Typing { who, .. } => who,
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireEvent {
    Channel {
        channel_id: ChannelId,
        username: String,
        content: String,
    },
    Dm {
        sender: String,
        receiver: String,
        content: String,
    },
    Typing {
        username: String,
        #[serde(default)]
        channel_id: Option<ChannelId>,
        #[serde(default)]
        sender: Option<String>,
    },
}

impl TryFrom<WireEvent> for InboundEvent {
    type Error = MalformedEvent;

    fn try_from(wire: WireEvent) -> Result<Self, Self::Error> {
        match wire {
            WireEvent::Channel {
                channel_id,
                username,
                content,
            } => Ok(InboundEvent::ChannelMessage {
                channel_id,
                author: username,
                content,
            }),
            WireEvent::Dm {
                sender,
                receiver,
                content,
            } => Ok(InboundEvent::DirectMessage {
                sender,
                receiver,
                content,
            }),
            WireEvent::Typing {
                username,
                channel_id,
                sender,
            } => {
                let scope = match (channel_id, sender) {
                    (Some(channel_id), _) => TypingScope::Channel(channel_id),
                    (None, Some(sender)) => TypingScope::Direct(sender),
                    (None, None) => {
                        return Err(MalformedEvent(
                            "typing event without channel_id or sender".to_string(),
                        ))
                    }
                };
                Ok(InboundEvent::Typing {
                    who: username,
                    scope,
                })
            }
        }
    }
}

/// Frames sent to the server. A frame without `content` is a typing ping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OutboundFrame {
    ChannelMessage {
        channel_id: ChannelId,
        content: String,
    },
    DirectMessage {
        receiver: String,
        content: String,
    },
    ChannelTyping {
        channel_id: ChannelId,
    },
    DirectTyping {
        receiver: String,
    },
}

impl OutboundFrame {
    pub fn message(target: &Target, content: String) -> Self {
        match target {
            Target::Channel(channel_id) => OutboundFrame::ChannelMessage {
                channel_id: *channel_id,
                content,
            },
            Target::Direct(receiver) => OutboundFrame::DirectMessage {
                receiver: receiver.clone(),
                content,
            },
        }
    }

    pub fn typing(target: &Target) -> Self {
        match target {
            Target::Channel(channel_id) => OutboundFrame::ChannelTyping {
                channel_id: *channel_id,
            },
            Target::Direct(receiver) => OutboundFrame::DirectTyping {
                receiver: receiver.clone(),
            },
        }
    }
}

/// What the view layer has to show, in the order it happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    ConnectionState(ConnState),
    /// The message list and typing indicator are reset for the new context.
    ContextChanged(ConversationContext),
    HistoryLoaded(Vec<MessageLine>),
    MessageAppended(MessageLine),
    TypingShown { who: String },
    TypingCleared,
    Feedback(Acknowledgment),
    MuteChanged(bool),
    SessionEnded,
}

#[cfg(test)]
mod tests {
    use super::{InboundEvent, OutboundFrame, TypingScope};
    use crate::transport::types::Target;

    /// Channel messages decode with their author.
    #[test]
    fn decode_channel_message() {
        // Arrange
        let text = r#"{"type":"channel","channel_id":7,"username":"bob","content":"hi"}"#;
        // Act
        let event = InboundEvent::decode(text).expect("decode");
        // Assert
        assert_eq!(
            event,
            InboundEvent::ChannelMessage {
                channel_id: 7,
                author: "bob".to_string(),
                content: "hi".to_string(),
            }
        );
        assert_eq!(event.author(), "bob");
    }

    /// Direct messages keep both ends of the exchange.
    #[test]
    fn decode_direct_message() {
        // Arrange
        let text = r#"{"type":"dm","sender":"bob","receiver":"alice","content":"psst"}"#;
        // Act
        let event = InboundEvent::decode(text).expect("decode");
        // Assert
        assert!(matches!(
            &event,
            InboundEvent::DirectMessage { sender, receiver, .. }
                if sender == "bob" && receiver == "alice"
        ));
        assert_eq!(event.author(), "bob");
    }

    /// The presence of channel_id or sender decides the typing scope.
    #[test]
    fn decode_typing_scopes() {
        // Arrange
        let channel = r#"{"type":"typing","username":"bob","channel_id":3}"#;
        let direct = r#"{"type":"typing","username":"bob","sender":"bob"}"#;

        // Act
        let channel = InboundEvent::decode(channel).expect("channel typing");
        let direct = InboundEvent::decode(direct).expect("direct typing");

        // Assert
        assert_eq!(
            channel,
            InboundEvent::Typing {
                who: "bob".to_string(),
                scope: TypingScope::Channel(3),
            }
        );
        assert_eq!(
            direct,
            InboundEvent::Typing {
                who: "bob".to_string(),
                scope: TypingScope::Direct("bob".to_string()),
            }
        );
    }

    /// Garbage, unknown tags and scope-less typing frames are malformed.
    #[test]
    fn decode_rejects_malformed_frames() {
        assert!(InboundEvent::decode("not json").is_err());
        assert!(InboundEvent::decode(r#"{"type":"presence","username":"bob"}"#).is_err());
        assert!(InboundEvent::decode(r#"{"type":"channel","username":"bob"}"#).is_err());
        assert!(InboundEvent::decode(r#"{"type":"typing","username":"bob"}"#).is_err());
    }

    /// Outbound frames serialize to the flat shapes the server expects.
    #[test]
    fn outbound_frames_serialize_flat() {
        // Arrange
        let channel = Target::Channel(7);
        let direct = Target::Direct("bob".to_string());

        // Act
        let frames = [
            OutboundFrame::message(&channel, "hi".to_string()),
            OutboundFrame::message(&direct, "yo".to_string()),
            OutboundFrame::typing(&channel),
            OutboundFrame::typing(&direct),
        ]
        .iter()
        .map(|frame| serde_json::to_string(frame).expect("encode"))
        .collect::<Vec<_>>();

        // Assert
        assert_eq!(
            frames,
            vec![
                r#"{"channel_id":7,"content":"hi"}"#,
                r#"{"receiver":"bob","content":"yo"}"#,
                r#"{"channel_id":7}"#,
                r#"{"receiver":"bob"}"#,
            ]
        );
    }
}
