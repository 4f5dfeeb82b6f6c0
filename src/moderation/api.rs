use crate::error::ModerationError;
use crate::moderation::issued::IssuedBans;
use crate::moderation::notifier::LogRecord;
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use serenity::model::permissions::Permissions;

/// A community the bot can currently reach, with the name used in log records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityHandle {
    pub id: GuildId,
    pub name: String,
}

/// The user a moderation action is aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUser {
    pub id: UserId,
    pub tag: String,
}

impl TargetUser {
    /// Used when only an id is known, e.g. `/unban` or a deny-list hit.
    pub fn from_id(id: UserId) -> Self {
        Self {
            id,
            tag: id.to_string(),
        }
    }
}

/// What the core needs to know about a member of one community.
#[derive(Debug, Clone)]
pub struct MemberSnapshot {
    pub user_id: UserId,
    pub tag: String,
    pub role_ids: Vec<RoleId>,
    /// Position of the member's highest role; `0` for `@everyone` only.
    pub highest_role_position: i64,
    pub permissions: Permissions,
}

/// Who issued a ban, according to the community's audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BanAuditEntry {
    pub executor_id: UserId,
    pub executor_tag: Option<String>,
    pub reason: Option<String>,
}

/// Every remote call the moderation core makes goes through this trait.
///
/// Each call may fail on its own; nothing here is atomic across communities.
#[async_trait]
pub trait ModerationApi: Send + Sync {
    fn current_user_id(&self) -> UserId;

    /// Communities the bot has an active session in.
    fn active_communities(&self) -> Vec<CommunityHandle>;

    /// Resolves a community the bot is currently in.
    fn community(&self, id: GuildId) -> Option<CommunityHandle>;

    /// Bans issued by this process whose gateway event has not arrived yet.
    fn issued_bans(&self) -> &IssuedBans;

    /// `Ok(None)` when the user is not a member of `community`.
    async fn fetch_member(
        &self,
        community: GuildId,
        user: UserId,
    ) -> Result<Option<MemberSnapshot>, ModerationError>;

    async fn ban_member(
        &self,
        community: GuildId,
        user: UserId,
        reason: &str,
        prune_days: u8,
    ) -> Result<(), ModerationError>;

    async fn kick_member(
        &self,
        community: GuildId,
        user: UserId,
        reason: &str,
    ) -> Result<(), ModerationError>;

    async fn unban_member(
        &self,
        community: GuildId,
        user: UserId,
        reason: &str,
    ) -> Result<(), ModerationError>;

    /// The newest ban audit entry for `user`, if it is recent enough to belong
    /// to the ban event being handled.
    async fn recent_ban_entry(
        &self,
        community: GuildId,
        user: UserId,
    ) -> Result<Option<BanAuditEntry>, ModerationError>;

    async fn send_log(&self, channel: ChannelId, record: &LogRecord)
        -> Result<(), ModerationError>;
}
