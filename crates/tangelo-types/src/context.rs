//! Chat-platform context structs.
//!
//! The host chat layer hands one [`ChatContext`] to the core per invocation.
//! These are plain owned data: the core never talks to the chat SDK itself,
//! it only reads identity/server/channel fields from this snapshot.

use chrono::{DateTime, TimeZone, Utc};

/// Presence status of a user, as reported by the chat platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Online,
    Idle,
    Dnd,
    Offline,
}

impl std::fmt::Display for Presence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Presence::Online => "Online",
            Presence::Idle => "Idle",
            Presence::Dnd => "Dnd",
            Presence::Offline => "Offline",
        };
        f.write_str(s)
    }
}

/// Server-membership details for the invoking user.
///
/// `None` at the [`UserProfile`] level means the user is not a member of the
/// server the command was invoked in (e.g. a webhook or a departed user).
#[derive(Debug, Clone)]
pub struct MemberInfo {
    pub joined_at: Option<DateTime<Utc>>,
    /// Role names, excluding the implicit everyone role.
    pub roles: Vec<String>,
    pub status: Presence,
}

/// The invoking user's profile.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: u64,
    pub name: String,
    pub discriminator: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub member: Option<MemberInfo>,
}

impl UserProfile {
    /// The platform mention string for this user.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// The server (guild) the invocation happened in.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub id: u64,
    pub name: String,
    pub member_count: u64,
    pub icon_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub owner_name: Option<String>,
    pub boost_count: u32,
    pub banner_url: Option<String>,
    pub description: Option<String>,
}

/// The channel the invocation happened in.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub id: u64,
    pub name: String,
}

/// Everything the core knows about one inbound invocation's surroundings.
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub user: UserProfile,
    pub server: ServerInfo,
    pub channel: ChannelInfo,
    /// Id of the triggering message.
    pub message_id: u64,
}

impl ChatContext {
    /// Canonical fixture used by tests across the workspace.
    pub fn sample() -> Self {
        ChatContext {
            user: UserProfile {
                id: 4242,
                name: "Alice".to_string(),
                discriminator: "0001".to_string(),
                avatar_url: Some("https://cdn.example/avatars/alice.png".to_string()),
                created_at: Utc.with_ymd_and_hms(2020, 3, 14, 9, 26, 53).unwrap(),
                member: Some(MemberInfo {
                    joined_at: Some(Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap()),
                    roles: vec!["Admin".to_string(), "Gardener".to_string()],
                    status: Presence::Online,
                }),
            },
            server: ServerInfo {
                id: 9001,
                name: "Testland".to_string(),
                member_count: 128,
                icon_url: None,
                created_at: Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap(),
                owner_name: Some("Bob".to_string()),
                boost_count: 3,
                banner_url: None,
                description: None,
            },
            channel: ChannelInfo {
                id: 7007,
                name: "general".to_string(),
            },
            message_id: 555_000_111,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mention_format() {
        let ctx = ChatContext::sample();
        assert_eq!(ctx.user.mention(), "<@4242>");
    }

    #[test]
    fn presence_display() {
        assert_eq!(Presence::Online.to_string(), "Online");
        assert_eq!(Presence::Dnd.to_string(), "Dnd");
    }

    #[test]
    fn sample_is_member() {
        let ctx = ChatContext::sample();
        let member = ctx.user.member.as_ref().unwrap();
        assert_eq!(member.roles.len(), 2);
        assert!(member.joined_at.is_some());
    }
}
