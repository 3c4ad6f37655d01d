use crate::chat::session::Session;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Acknowledgment {
    Sent,
    Received,
}

/// Which sound a rendered message should trigger, if any.
pub fn acknowledgment(author: &str, session: &Session) -> Option<Acknowledgment> {
    if session.is_muted() {
        return None;
    }
    if author == session.user_id() {
        Some(Acknowledgment::Sent)
    } else {
        Some(Acknowledgment::Received)
    }
}
