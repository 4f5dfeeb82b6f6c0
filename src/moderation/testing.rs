//! Recording stand-in for the platform, used by the moderation tests.

use crate::data::store::{ConfigStore, SharedStore};
use crate::error::ModerationError;
use crate::moderation::api::{BanAuditEntry, CommunityHandle, MemberSnapshot, ModerationApi};
use crate::moderation::issued::IssuedBans;
use crate::moderation::notifier::LogRecord;
use serenity::async_trait;
use serenity::model::id::{ChannelId, GuildId, UserId};
use serenity::model::permissions::Permissions;
use serenity::prelude::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub const BOT_ID: UserId = UserId(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    FetchMember { community: GuildId, user: UserId },
    Ban { community: GuildId, user: UserId, reason: String, prune_days: u8 },
    Kick { community: GuildId, user: UserId, reason: String },
    Unban { community: GuildId, user: UserId, reason: String },
    RecentBan { community: GuildId, user: UserId },
    SendLog { channel: ChannelId, title: String },
}

#[derive(Default)]
pub struct FakeApi {
    communities: Vec<CommunityHandle>,
    members: HashMap<(GuildId, UserId), MemberSnapshot>,
    failing_bans: HashSet<GuildId>,
    failing_lookups: HashSet<GuildId>,
    failing_logs: HashSet<ChannelId>,
    audit: HashMap<GuildId, BanAuditEntry>,
    issued: IssuedBans,
    calls: Mutex<Vec<ApiCall>>,
}

pub fn shared_store() -> SharedStore {
    Arc::new(RwLock::new(ConfigStore::empty("unused-config.json")))
}

pub fn member(user: UserId, position: i64, permissions: Permissions) -> MemberSnapshot {
    MemberSnapshot {
        user_id: user,
        tag: format!("user{}#0001", user.0),
        role_ids: Vec::new(),
        highest_role_position: position,
        permissions,
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a community where the bot is a member holding `bot_permissions` at rank 10.
    pub fn with_community(mut self, id: u64, name: &str, bot_permissions: Permissions) -> Self {
        let id = GuildId(id);
        self.communities.push(CommunityHandle {
            id,
            name: name.to_string(),
        });
        self.members
            .insert((id, BOT_ID), member(BOT_ID, 10, bot_permissions));
        self
    }

    pub fn with_member(mut self, community: u64, snapshot: MemberSnapshot) -> Self {
        self.members
            .insert((GuildId(community), snapshot.user_id), snapshot);
        self
    }

    pub fn failing_ban(mut self, community: u64) -> Self {
        self.failing_bans.insert(GuildId(community));
        self
    }

    /// Member lookups of anyone but the bot fail in `community`.
    pub fn failing_lookup(mut self, community: u64) -> Self {
        self.failing_lookups.insert(GuildId(community));
        self
    }

    pub fn failing_log(mut self, channel: ChannelId) -> Self {
        self.failing_logs.insert(channel);
        self
    }

    pub fn with_audit(mut self, community: u64, entry: BanAuditEntry) -> Self {
        self.audit.insert(GuildId(community), entry);
        self
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn bans(&self) -> Vec<(GuildId, UserId, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::Ban {
                    community,
                    user,
                    reason,
                    ..
                } => Some((community, user, reason)),
                _ => None,
            })
            .collect()
    }

    pub fn logs(&self) -> Vec<(ChannelId, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ApiCall::SendLog { channel, title } => Some((channel, title)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ModerationApi for FakeApi {
    fn current_user_id(&self) -> UserId {
        BOT_ID
    }

    fn active_communities(&self) -> Vec<CommunityHandle> {
        self.communities.clone()
    }

    fn community(&self, id: GuildId) -> Option<CommunityHandle> {
        self.communities.iter().find(|c| c.id == id).cloned()
    }

    fn issued_bans(&self) -> &IssuedBans {
        &self.issued
    }

    async fn fetch_member(
        &self,
        community: GuildId,
        user: UserId,
    ) -> Result<Option<MemberSnapshot>, ModerationError> {
        self.record(ApiCall::FetchMember { community, user });
        if user != BOT_ID && self.failing_lookups.contains(&community) {
            return Err(ModerationError::remote("Member lookup", "503 Service Unavailable"));
        }
        Ok(self.members.get(&(community, user)).cloned())
    }

    async fn ban_member(
        &self,
        community: GuildId,
        user: UserId,
        reason: &str,
        prune_days: u8,
    ) -> Result<(), ModerationError> {
        self.record(ApiCall::Ban {
            community,
            user,
            reason: reason.to_string(),
            prune_days,
        });
        if self.failing_bans.contains(&community) {
            return Err(ModerationError::remote("Ban", "Missing Permissions"));
        }
        Ok(())
    }

    async fn kick_member(
        &self,
        community: GuildId,
        user: UserId,
        reason: &str,
    ) -> Result<(), ModerationError> {
        self.record(ApiCall::Kick {
            community,
            user,
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn unban_member(
        &self,
        community: GuildId,
        user: UserId,
        reason: &str,
    ) -> Result<(), ModerationError> {
        self.record(ApiCall::Unban {
            community,
            user,
            reason: reason.to_string(),
        });
        Ok(())
    }

    async fn recent_ban_entry(
        &self,
        community: GuildId,
        user: UserId,
    ) -> Result<Option<BanAuditEntry>, ModerationError> {
        self.record(ApiCall::RecentBan { community, user });
        Ok(self.audit.get(&community).cloned())
    }

    async fn send_log(
        &self,
        channel: ChannelId,
        record: &LogRecord,
    ) -> Result<(), ModerationError> {
        self.record(ApiCall::SendLog {
            channel,
            title: record.title.clone(),
        });
        if self.failing_logs.contains(&channel) {
            return Err(ModerationError::remote("Log", "Unknown Channel"));
        }
        Ok(())
    }
}
