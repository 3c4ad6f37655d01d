use crate::chat::context::ConversationContext;
use crate::chat::events::{InboundEvent, TypingScope};
use crate::transport::types::Target;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relevance {
    ChannelMatch,
    DirectMatch,
    TypingMatch,
    Ignored,
}

/// Decides whether `event` touches the conversation being viewed right now.
///
/// Pure: the verdict depends only on the arguments. Callers pass the context as it is at
/// delivery time, so events for a conversation the user already left fall through to
/// [`Relevance::Ignored`].
pub fn classify(
    event: &InboundEvent,
    context: Option<&ConversationContext>,
    self_id: &str,
) -> Relevance {
    let Some(context) = context else {
        return Relevance::Ignored;
    };

    match (event, context.target()) {
        (InboundEvent::ChannelMessage { channel_id, .. }, Target::Channel(active))
            if channel_id == active =>
        {
            Relevance::ChannelMatch
        }
        (
            InboundEvent::DirectMessage {
                sender, receiver, ..
            },
            Target::Direct(counterpart),
        ) if is_pair(sender, receiver, self_id, counterpart) => Relevance::DirectMatch,
        (InboundEvent::Typing { who, scope }, target) if who != self_id => {
            let same_conversation = match (scope, target) {
                (TypingScope::Channel(channel_id), Target::Channel(active)) => channel_id == active,
                (TypingScope::Direct(counterpart), Target::Direct(active)) => counterpart == active,
                _ => false,
            };
            if same_conversation {
                Relevance::TypingMatch
            } else {
                Relevance::Ignored
            }
        }
        _ => Relevance::Ignored,
    }
}

/// Unordered comparison of {sender, receiver} with {self, counterpart}.
fn is_pair(sender: &str, receiver: &str, self_id: &str, counterpart: &str) -> bool {
    (sender == self_id && receiver == counterpart) || (sender == counterpart && receiver == self_id)
}

#[cfg(test)]
mod tests {
    use super::{classify, Relevance};
    use crate::chat::context::ConversationContext;
    use crate::chat::events::{InboundEvent, TypingScope};
    use crate::transport::types::Target;

    fn channel(id: i64) -> ConversationContext {
        ConversationContext::new(Target::Channel(id), format!("channel-{id}"))
    }

    fn direct(user: &str) -> ConversationContext {
        ConversationContext::new(Target::Direct(user.to_string()), user.to_string())
    }

    fn channel_message(channel_id: i64, author: &str) -> InboundEvent {
        InboundEvent::ChannelMessage {
            channel_id,
            author: author.to_string(),
            content: "hi".to_string(),
        }
    }

    fn direct_message(sender: &str, receiver: &str) -> InboundEvent {
        InboundEvent::DirectMessage {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            content: "hi".to_string(),
        }
    }

    fn typing(who: &str, scope: TypingScope) -> InboundEvent {
        InboundEvent::Typing {
            who: who.to_string(),
            scope,
        }
    }

    /// Channel messages match only the active channel.
    #[test]
    fn channel_message_matches_active_channel_only() {
        // Arrange
        let context = channel(7);
        // Act
        let same = classify(&channel_message(7, "bob"), Some(&context), "alice");
        let other = classify(&channel_message(9, "bob"), Some(&context), "alice");
        let in_direct = classify(&channel_message(7, "bob"), Some(&direct("bob")), "alice");
        // Assert
        assert_eq!(same, Relevance::ChannelMatch);
        assert_eq!(other, Relevance::Ignored);
        assert_eq!(in_direct, Relevance::Ignored);
    }

    /// Own messages to the counterpart and the counterpart's replies both match.
    #[test]
    fn direct_message_matches_in_both_directions() {
        // Arrange
        let context = direct("bob");
        // Act
        let outgoing = classify(&direct_message("alice", "bob"), Some(&context), "alice");
        let incoming = classify(&direct_message("bob", "alice"), Some(&context), "alice");
        // Assert
        assert_eq!(outgoing, Relevance::DirectMatch);
        assert_eq!(incoming, Relevance::DirectMatch);
    }

    /// A message sent to X is ignored while viewing a different counterpart.
    #[test]
    fn direct_message_to_other_counterpart_is_ignored() {
        // Arrange
        let event = direct_message("alice", "xavier");
        // Act
        let viewing_x = classify(&event, Some(&direct("xavier")), "alice");
        let viewing_y = classify(&event, Some(&direct("yolanda")), "alice");
        let between_others = classify(
            &direct_message("bob", "carol"),
            Some(&direct("bob")),
            "alice",
        );
        // Assert
        assert_eq!(viewing_x, Relevance::DirectMatch);
        assert_eq!(viewing_y, Relevance::Ignored);
        assert_eq!(between_others, Relevance::Ignored);
    }

    /// Typing matches the active conversation but never the user's own echo.
    #[test]
    fn typing_matches_active_conversation_from_peers() {
        // Arrange
        let in_channel = channel(7);
        let with_bob = direct("bob");

        // Act
        let peer_in_channel = classify(
            &typing("bob", TypingScope::Channel(7)),
            Some(&in_channel),
            "alice",
        );
        let other_channel = classify(
            &typing("bob", TypingScope::Channel(8)),
            Some(&in_channel),
            "alice",
        );
        let own_echo = classify(
            &typing("alice", TypingScope::Channel(7)),
            Some(&in_channel),
            "alice",
        );
        let bob_direct = classify(
            &typing("bob", TypingScope::Direct("bob".to_string())),
            Some(&with_bob),
            "alice",
        );
        let carol_direct = classify(
            &typing("carol", TypingScope::Direct("carol".to_string())),
            Some(&with_bob),
            "alice",
        );
        let scope_mismatch = classify(
            &typing("bob", TypingScope::Channel(7)),
            Some(&with_bob),
            "alice",
        );

        // Assert
        assert_eq!(peer_in_channel, Relevance::TypingMatch);
        assert_eq!(other_channel, Relevance::Ignored);
        assert_eq!(own_echo, Relevance::Ignored);
        assert_eq!(bob_direct, Relevance::TypingMatch);
        assert_eq!(carol_direct, Relevance::Ignored);
        assert_eq!(scope_mismatch, Relevance::Ignored);
    }

    /// Nothing is relevant before a context is chosen.
    #[test]
    fn no_context_ignores_everything() {
        assert_eq!(
            classify(&channel_message(7, "bob"), None, "alice"),
            Relevance::Ignored
        );
        assert_eq!(
            classify(&direct_message("bob", "alice"), None, "alice"),
            Relevance::Ignored
        );
        assert_eq!(
            classify(&typing("bob", TypingScope::Channel(7)), None, "alice"),
            Relevance::Ignored
        );
    }

    /// Same inputs always give the same verdict.
    #[test]
    fn classification_is_repeatable() {
        // Arrange
        let context = channel(7);
        let events = [
            channel_message(7, "bob"),
            channel_message(8, "bob"),
            direct_message("bob", "alice"),
            typing("bob", TypingScope::Channel(7)),
        ];

        for event in &events {
            // Act
            let first = classify(event, Some(&context), "alice");
            let second = classify(event, Some(&context), "alice");
            // Assert
            assert_eq!(first, second);
        }
    }
}
