use serde::{Deserialize, Serialize};
use serenity::model::id::{ChannelId, GuildId, RoleId};
use std::collections::BTreeMap;

/// Per-community settings, keyed by community id in the store file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityConfig {
    #[serde(rename = "roles", default)]
    pub moderator_role_ids: Vec<RoleId>,
    #[serde(rename = "banSyncGuilds", default)]
    pub sync_targets: Vec<GuildId>,
    #[serde(default)]
    pub log_channel_id: Option<ChannelId>,
    #[serde(default)]
    pub auto_message: Option<AutoMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoMessage {
    pub channel_id: ChannelId,
    #[serde(rename = "messageContent")]
    pub text: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(rename = "blacklistedGuilds", default)]
    pub blacklisted_communities: Vec<GuildId>,
}

/// On-disk layout: `_global` next to one entry per community id.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct ConfigFile {
    #[serde(rename = "_global", default)]
    pub(crate) global: GlobalConfig,
    #[serde(flatten)]
    pub(crate) communities: BTreeMap<String, CommunityConfig>,
}

fn insert_unique<T: PartialEq>(list: &mut Vec<T>, item: T) -> bool {
    if list.contains(&item) {
        return false;
    }
    list.push(item);
    true
}

fn remove_all<T: PartialEq>(list: &mut Vec<T>, item: &T) -> bool {
    let before = list.len();
    list.retain(|x| x != item);
    list.len() != before
}

impl CommunityConfig {
    pub fn add_moderator_role(&mut self, role: RoleId) -> bool {
        insert_unique(&mut self.moderator_role_ids, role)
    }

    pub fn add_sync_target(&mut self, community: GuildId) -> bool {
        insert_unique(&mut self.sync_targets, community)
    }

    pub fn remove_sync_target(&mut self, community: GuildId) -> bool {
        remove_all(&mut self.sync_targets, &community)
    }
}

impl GlobalConfig {
    pub fn add_blacklisted(&mut self, community: GuildId) -> bool {
        insert_unique(&mut self.blacklisted_communities, community)
    }

    pub fn remove_blacklisted(&mut self, community: GuildId) -> bool {
        remove_all(&mut self.blacklisted_communities, &community)
    }
}
