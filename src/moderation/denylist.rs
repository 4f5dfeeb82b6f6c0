use crate::data::store::SharedStore;
use crate::error::ModerationError;
use crate::moderation::api::{CommunityHandle, ModerationApi, TargetUser};
use crate::moderation::executor::{bot_member, issue_ban};
use crate::moderation::fanout::{attempt_all, TargetOutcome};
use crate::moderation::notifier::{notify, LogRecord};
use crate::moderation::outcome::{ActionKind, ModerationOutcome};
use crate::moderation::permission::holds;
use serenity::model::permissions::Permissions;
use tracing::{debug, info, warn};

/// A user joined `community`.
#[derive(Debug, Clone)]
pub struct MemberJoin {
    pub community: CommunityHandle,
    pub user: TargetUser,
}

/// The watched community that matched and what the sweep did.
#[derive(Debug)]
pub struct DenyListHit {
    pub watched: CommunityHandle,
    pub reason: String,
    pub sweep: Vec<TargetOutcome<()>>,
}

/// Checks a joining user against the watched communities, in list order.
///
/// The first watched community the user belongs to triggers a ban sweep over
/// every community the bot is in; later entries are not looked at.
pub async fn check_member_join(
    api: &dyn ModerationApi,
    store: &SharedStore,
    join: &MemberJoin,
) -> Option<DenyListHit> {
    let watched_ids = store.read().await.global().blacklisted_communities.clone();

    for watched_id in watched_ids {
        let Some(watched) = api.community(watched_id) else {
            debug!("Watched community {} is not reachable, skipping", watched_id);
            continue;
        };

        match api.fetch_member(watched.id, join.user.id).await {
            Ok(Some(_)) => {}
            Ok(None) => continue,
            Err(why) => {
                warn!("Error checking watched community {}: {}", watched.id, why);
                continue;
            }
        }

        info!(
            "{} joined {} and is a member of watched community {}",
            join.user.id, join.community.name, watched.name
        );
        let reason = format!(
            "Auto-ban: User found in blacklisted guild {} ({})",
            watched.name, watched.id
        );
        let moderator_tag = format!("AutoBanNet (blacklist: {})", watched.id);
        let sweep = ban_everywhere(api, store, &join.user, &reason, &moderator_tag).await;

        let summary = ModerationOutcome {
            action: ActionKind::BlacklistTriggered,
            target: join.user.clone(),
            moderator_tag,
            reason: Some(reason.clone()),
            origin: join.community.name.clone(),
            prune_days: None,
        };
        notify(api, store, join.community.id, &LogRecord::from(&summary)).await;

        return Some(DenyListHit {
            watched,
            reason,
            sweep,
        });
    }

    None
}

/// Bans `user` in every community of the current session.
pub async fn ban_everywhere(
    api: &dyn ModerationApi,
    store: &SharedStore,
    user: &TargetUser,
    reason: &str,
    moderator_tag: &str,
) -> Vec<TargetOutcome<()>> {
    let communities = api.active_communities();
    let ids: Vec<_> = communities.iter().map(|c| c.id).collect();
    let communities = &communities;

    attempt_all("Blacklist ban", ids, move |community| async move {
        let me = bot_member(api, community).await?;
        if !holds(me.permissions, Permissions::BAN_MEMBERS) {
            return Err(ModerationError::MissingPermissions(
                "I need Ban Members permission.".to_string(),
            ));
        }
        issue_ban(api, community, user.id, reason, 0).await?;

        let name = communities
            .iter()
            .find(|c| c.id == community)
            .map(|c| c.name.as_str())
            .unwrap_or_default();
        let outcome = ModerationOutcome {
            action: ActionKind::BlacklistBan,
            target: TargetUser::from_id(user.id),
            moderator_tag: moderator_tag.to_string(),
            reason: Some(reason.to_string()),
            origin: format!("{} (auto)", name),
            prune_days: None,
        };
        notify(api, store, community, &LogRecord::from(&outcome)).await;
        Ok(())
    })
    .await
}
