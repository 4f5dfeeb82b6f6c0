use crate::error::ModerationError;
use crate::moderation::api::{BanAuditEntry, CommunityHandle, MemberSnapshot, ModerationApi};
use crate::moderation::issued::IssuedBans;
use crate::moderation::notifier::LogRecord;
use crate::utils::embeds::render;
use serenity::async_trait;
use serenity::client::Context;
use serenity::http::HttpError;
use serenity::model::guild::Member;
use serenity::model::id::{ChannelId, GuildId, UserId};
use serenity::model::permissions::Permissions;
use serenity::model::prelude::Timestamp;
use serenity::Error as SerenityError;
use std::sync::Arc;

/// Audit log action type for "member ban add".
const MEMBER_BAN_ADD: u8 = 22;
/// Audit entries older than this belong to some earlier ban.
const AUDIT_WINDOW_SECS: i64 = 10;

/// `ModerationApi` over a live gateway session.
#[derive(Clone)]
pub struct SerenityApi {
    ctx: Context,
    issued: Arc<IssuedBans>,
}

impl SerenityApi {
    pub fn new(ctx: &Context, issued: &Arc<IssuedBans>) -> Self {
        Self {
            ctx: ctx.clone(),
            issued: Arc::clone(issued),
        }
    }

    fn snapshot(&self, member: &Member) -> MemberSnapshot {
        MemberSnapshot {
            user_id: member.user.id,
            tag: member.user.tag(),
            role_ids: member.roles.clone(),
            highest_role_position: member
                .highest_role_info(&self.ctx.cache)
                .map(|(_, position)| position)
                .unwrap_or(0),
            permissions: member
                .permissions(&self.ctx.cache)
                .unwrap_or_else(|_| Permissions::empty()),
        }
    }
}

fn is_not_found(err: &SerenityError) -> bool {
    match err {
        SerenityError::Http(http) => matches!(
            &**http,
            HttpError::UnsuccessfulRequest(response) if response.status_code.as_u16() == 404
        ),
        _ => false,
    }
}

#[async_trait]
impl ModerationApi for SerenityApi {
    fn current_user_id(&self) -> UserId {
        self.ctx.cache.current_user_id()
    }

    fn active_communities(&self) -> Vec<CommunityHandle> {
        self.ctx
            .cache
            .guilds()
            .into_iter()
            .filter_map(|id| self.community(id))
            .collect()
    }

    fn community(&self, id: GuildId) -> Option<CommunityHandle> {
        self.ctx
            .cache
            .guild_field(id, |guild| guild.name.clone())
            .map(|name| CommunityHandle { id, name })
    }

    fn issued_bans(&self) -> &IssuedBans {
        &self.issued
    }

    async fn fetch_member(
        &self,
        community: GuildId,
        user: UserId,
    ) -> Result<Option<MemberSnapshot>, ModerationError> {
        match community.member(&self.ctx, user).await {
            Ok(member) => Ok(Some(self.snapshot(&member))),
            Err(why) if is_not_found(&why) => Ok(None),
            Err(why) => Err(ModerationError::remote("Member lookup", why)),
        }
    }

    async fn ban_member(
        &self,
        community: GuildId,
        user: UserId,
        reason: &str,
        prune_days: u8,
    ) -> Result<(), ModerationError> {
        community
            .ban_with_reason(&self.ctx.http, user, prune_days, reason)
            .await
            .map_err(|why| ModerationError::remote("Ban", why))
    }

    async fn kick_member(
        &self,
        community: GuildId,
        user: UserId,
        reason: &str,
    ) -> Result<(), ModerationError> {
        community
            .kick_with_reason(&self.ctx.http, user, reason)
            .await
            .map_err(|why| ModerationError::remote("Kick", why))
    }

    async fn unban_member(
        &self,
        community: GuildId,
        user: UserId,
        reason: &str,
    ) -> Result<(), ModerationError> {
        self.ctx
            .http
            .remove_ban(community.0, user.0, Some(reason))
            .await
            .map_err(|why| ModerationError::remote("Unban", why))
    }

    async fn recent_ban_entry(
        &self,
        community: GuildId,
        user: UserId,
    ) -> Result<Option<BanAuditEntry>, ModerationError> {
        let logs = community
            .audit_logs(&self.ctx.http, Some(MEMBER_BAN_ADD), None, None, Some(1))
            .await
            .map_err(|why| ModerationError::remote("Audit log", why))?;

        let Some(entry) = logs.entries.iter().max_by_key(|e| e.id) else {
            return Ok(None);
        };
        let age = Timestamp::now().unix_timestamp() - entry.id.created_at().unix_timestamp();
        if age >= AUDIT_WINDOW_SECS || entry.target_id != Some(user.0) {
            return Ok(None);
        }

        Ok(Some(BanAuditEntry {
            executor_id: entry.user_id,
            executor_tag: logs.users.get(&entry.user_id).map(|u| u.tag()),
            reason: entry.reason.clone(),
        }))
    }

    async fn send_log(
        &self,
        channel: ChannelId,
        record: &LogRecord,
    ) -> Result<(), ModerationError> {
        channel
            .send_message(&self.ctx.http, |m| m.embed(|e| render(e, record)))
            .await
            .map(|_| ())
            .map_err(|why| ModerationError::remote("Log", why))
    }
}
