use std::collections::HashMap;

use crate::transport::types::{Channel, ChannelId, Member, Target};

/// Channels and members known to the client, used to turn user input into targets.
#[derive(Debug, Default)]
pub struct Directory {
    channels: HashMap<ChannelId, Channel>,
    members: HashMap<String, Member>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.get(&id)
    }

    pub fn member(&self, username: &str) -> Option<&Member> {
        self.members.get(username)
    }

    pub fn apply_channels(&mut self, channels: Vec<Channel>) {
        self.channels = channels
            .into_iter()
            .map(|channel| (channel.id, channel))
            .collect();
    }

    /// Replaces the member list. The session's own user is left out.
    pub fn apply_members(&mut self, members: Vec<Member>, self_id: &str) {
        self.members = members
            .into_iter()
            .filter(|member| member.username != self_id)
            .map(|member| (member.username.clone(), member))
            .collect();
    }

    pub fn channels(&self) -> Vec<Channel> {
        let mut channels = self.channels.values().cloned().collect::<Vec<_>>();
        channels.sort_by_key(|channel| channel.id);
        channels
    }

    pub fn members(&self) -> Vec<Member> {
        let mut members = self.members.values().cloned().collect::<Vec<_>>();
        members.sort_by(|a, b| a.username.cmp(&b.username));
        members
    }

    pub fn first_channel(&self) -> Option<&Channel> {
        self.channels.values().min_by_key(|channel| channel.id)
    }

    /// Resolves `#name`, `name` or a numeric id to a channel target and display name.
    pub fn resolve_channel(&self, query: &str) -> Option<(Target, String)> {
        let query = query.trim().trim_start_matches('#');
        let channel = match query.parse::<ChannelId>() {
            Ok(id) => self.channel(id),
            Err(_) => self.channels.values().find(|channel| channel.name == query),
        }?;
        Some((Target::Channel(channel.id), channel.name.clone()))
    }

    /// Resolves `@name` or `name` to a direct target and display name.
    pub fn resolve_member(&self, query: &str) -> Option<(Target, String)> {
        let query = query.trim().trim_start_matches('@');
        let member = self.member(query)?;
        Some((
            Target::Direct(member.username.clone()),
            member.username.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::Directory;
    use crate::transport::types::{Channel, Member, Target};

    fn channel(id: i64, name: &str) -> Channel {
        Channel {
            id,
            name: name.to_string(),
        }
    }

    fn member(username: &str) -> Member {
        Member {
            username: username.to_string(),
        }
    }

    /// Channel lists replace earlier ones and come back sorted by id.
    #[test]
    fn channels_are_replaced_and_sorted() {
        // Arrange
        let mut directory = Directory::new();
        directory.apply_channels(vec![channel(1, "stale")]);

        // Act
        directory.apply_channels(vec![channel(3, "random"), channel(2, "general")]);

        // Assert
        let channels = directory.channels();
        assert_eq!(channels, vec![channel(2, "general"), channel(3, "random")]);
        assert!(directory.channel(1).is_none());
        assert_eq!(directory.first_channel(), Some(&channel(2, "general")));
    }

    /// The session user never shows up as a direct-message counterpart.
    #[test]
    fn members_exclude_self() {
        // Arrange
        let mut directory = Directory::new();

        // Act
        directory.apply_members(vec![member("zed"), member("alice"), member("bob")], "alice");

        // Assert
        assert_eq!(directory.members(), vec![member("bob"), member("zed")]);
        assert!(directory.member("alice").is_none());
    }

    /// Channels resolve by name, hashed name or id.
    #[test]
    fn resolve_channel_by_name_or_id() {
        // Arrange
        let mut directory = Directory::new();
        directory.apply_channels(vec![channel(7, "general")]);
        let expected = Some((Target::Channel(7), "general".to_string()));

        // Act
        // Assert
        assert_eq!(directory.resolve_channel("general"), expected);
        assert_eq!(directory.resolve_channel("#general"), expected);
        assert_eq!(directory.resolve_channel("7"), expected);
        assert_eq!(directory.resolve_channel("9"), None);
        assert_eq!(directory.resolve_channel("random"), None);
    }

    /// Members resolve with or without the at sign.
    #[test]
    fn resolve_member_by_name() {
        // Arrange
        let mut directory = Directory::new();
        directory.apply_members(vec![member("bob")], "alice");
        let expected = Some((Target::Direct("bob".to_string()), "bob".to_string()));

        // Act
        // Assert
        assert_eq!(directory.resolve_member("bob"), expected);
        assert_eq!(directory.resolve_member("@bob"), expected);
        assert_eq!(directory.resolve_member("alice"), None);
    }

    /// An empty directory has no first channel.
    #[test]
    fn empty_directory_has_no_first_channel() {
        let directory = Directory::new();
        assert!(directory.first_channel().is_none());
        assert!(directory.channels().is_empty());
    }
}
