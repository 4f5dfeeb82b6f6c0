use crate::moderation::api::TargetUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Ban,
    Kick,
    Unban,
    /// A ban made outside the bot and picked up from the gateway.
    DetectedBan,
    SyncedBan,
    SyncedBanFailed,
    /// One ban of a deny-list sweep.
    BlacklistBan,
    /// The summary record sent to the community the user joined.
    BlacklistTriggered,
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Ban => "User Banned",
            ActionKind::Kick => "User Kicked",
            ActionKind::Unban => "User Unbanned",
            ActionKind::DetectedBan => "User Banned (Detected)",
            ActionKind::SyncedBan => "Synced Ban",
            ActionKind::SyncedBanFailed => "Synced Ban Failed",
            ActionKind::BlacklistBan => "Auto-Ban (Blacklist)",
            ActionKind::BlacklistTriggered => "Auto-Ban Triggered",
        }
    }
}

/// Result of one moderation action, as shown to the user and the log channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationOutcome {
    pub action: ActionKind,
    pub target: TargetUser,
    pub moderator_tag: String,
    pub reason: Option<String>,
    /// Display name of the community the record is about.
    pub origin: String,
    pub prune_days: Option<u8>,
}
