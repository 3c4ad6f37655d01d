/// The logged-in user. Exactly one lives in a client at a time.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    user_id: String,
    auth_token: String,
    muted: bool,
}

impl Session {
    pub fn new(user_id: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            auth_token: auth_token.into(),
            muted: false,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Flips the mute flag and returns the new value.
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("auth_token", &"<redacted>")
            .field("muted", &self.muted)
            .finish()
    }
}
