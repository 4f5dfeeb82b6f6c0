use crate::data::store::SharedStore;
use crate::error::ModerationError;
use crate::moderation::api::{CommunityHandle, ModerationApi, TargetUser};
use crate::moderation::executor::issue_ban;
use crate::moderation::fanout::{attempt_all, TargetOutcome};
use crate::moderation::notifier::{notify, LogRecord};
use crate::moderation::outcome::{ActionKind, ModerationOutcome};
use tracing::{debug, info};

/// A ban that already succeeded in its origin community.
#[derive(Debug, Clone)]
pub struct OriginBan {
    pub origin: CommunityHandle,
    pub target: TargetUser,
    pub moderator_tag: String,
    pub reason: Option<String>,
    pub prune_days: Option<u8>,
}

pub fn synced_reason(origin_name: &str, reason: Option<&str>) -> String {
    format!(
        "Synced ban from {}: {}",
        origin_name,
        reason.unwrap_or("No reason")
    )
}

/// Replays `ban` in every sync target of its origin.
///
/// One level deep: the bans issued here are never propagated again.
pub async fn propagate_ban(
    api: &dyn ModerationApi,
    store: &SharedStore,
    ban: &OriginBan,
) -> Vec<TargetOutcome<()>> {
    let targets = {
        let store = store.read().await;
        store
            .community(ban.origin.id)
            .map(|c| c.sync_targets.clone())
            .unwrap_or_default()
    };
    if targets.is_empty() {
        return Vec::new();
    }

    info!(
        "Propagating ban of {} from {} to {} communities",
        ban.target.id,
        ban.origin.name,
        targets.len()
    );
    let reason = synced_reason(&ban.origin.name, ban.reason.as_deref());
    let reason = reason.as_str();

    attempt_all("Synced ban", targets, move |target| async move {
        let result = match api.community(target) {
            Some(_) => {
                issue_ban(api, target, ban.target.id, reason, ban.prune_days.unwrap_or(0))
                    .await
            }
            None => Err(ModerationError::remote(
                "Ban",
                "community is not reachable from this session",
            )),
        };

        let target_name = api
            .community(target)
            .map(|c| c.name)
            .unwrap_or_else(|| target.to_string());
        let outcome = ModerationOutcome {
            action: if result.is_ok() {
                ActionKind::SyncedBan
            } else {
                ActionKind::SyncedBanFailed
            },
            target: ban.target.clone(),
            moderator_tag: format!("{} (origin)", ban.moderator_tag),
            reason: ban.reason.clone(),
            origin: format!("{} (synced from {})", target_name, ban.origin.name),
            prune_days: ban.prune_days,
        };
        notify(api, store, target, &LogRecord::from(&outcome)).await;
        result
    })
    .await
}

/// Handles a ban the gateway reported for `target` in `community`.
///
/// Bans this process issued (command, propagation or sweep) are ignored: they
/// were already logged and must not propagate again. They are recognised by
/// the issued-ban ledger first and by the audit log executor second. Anything
/// else is logged to the community and propagated to its sync targets.
pub async fn on_ban_detected(
    api: &dyn ModerationApi,
    store: &SharedStore,
    community: CommunityHandle,
    target: TargetUser,
) -> Vec<TargetOutcome<()>> {
    if api.issued_bans().take(community.id, target.id) {
        debug!("Ban of {} in {} was issued by us, already logged", target.id, community.id);
        return Vec::new();
    }

    let entry = match api.recent_ban_entry(community.id, target.id).await {
        Ok(entry) => entry,
        Err(why) => {
            debug!("Audit lookup in {} failed: {}", community.id, why);
            None
        }
    };
    let issued_by_bot = entry
        .as_ref()
        .map_or(false, |e| e.executor_id == api.current_user_id());
    let moderator_tag = entry
        .as_ref()
        .and_then(|e| e.executor_tag.clone())
        .unwrap_or_else(|| "Unknown".to_string());
    let reason = entry.and_then(|e| e.reason);

    if issued_by_bot {
        debug!("Ban of {} in {} was issued by us, already logged", target.id, community.id);
        return Vec::new();
    }

    let detected = ModerationOutcome {
        action: ActionKind::DetectedBan,
        target: target.clone(),
        moderator_tag: moderator_tag.clone(),
        reason: reason.clone(),
        origin: community.name.clone(),
        prune_days: None,
    };
    notify(api, store, community.id, &LogRecord::from(&detected)).await;

    let ban = OriginBan {
        origin: community,
        target,
        moderator_tag,
        reason,
        prune_days: None,
    };
    propagate_ban(api, store, &ban).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::api::BanAuditEntry;
    use crate::moderation::testing::{shared_store, ApiCall, FakeApi, BOT_ID};
    use serenity::model::id::{ChannelId, GuildId, UserId};
    use serenity::model::permissions::Permissions;

    fn ban_from_g1(reason: &str) -> OriginBan {
        OriginBan {
            origin: CommunityHandle {
                id: GuildId(1),
                name: "G1".to_string(),
            },
            target: TargetUser {
                id: UserId(501),
                tag: "U1#0001".to_string(),
            },
            moderator_tag: "mod#0001".to_string(),
            reason: Some(reason.to_string()),
            prune_days: None,
        }
    }

    #[tokio::test]
    async fn replays_with_annotated_reason() {
        let api = FakeApi::new()
            .with_community(1, "G1", Permissions::BAN_MEMBERS)
            .with_community(2, "G2", Permissions::BAN_MEMBERS);
        let store = shared_store();
        store.write().await.community_mut(GuildId(1)).add_sync_target(GuildId(2));

        let outcomes = propagate_ban(&api, &store, &ban_from_g1("spam")).await;

        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].succeeded());
        assert_eq!(
            api.bans(),
            vec![(GuildId(2), UserId(501), "Synced ban from G1: spam".to_string())]
        );
    }

    #[tokio::test]
    async fn one_failing_target_does_not_stop_the_rest() {
        let api = FakeApi::new()
            .with_community(1, "A", Permissions::BAN_MEMBERS)
            .with_community(2, "B", Permissions::BAN_MEMBERS)
            .with_community(4, "D", Permissions::BAN_MEMBERS)
            .failing_ban(2);
        let store = shared_store();
        {
            let mut store = store.write().await;
            let a = store.community_mut(GuildId(1));
            a.add_sync_target(GuildId(2));
            a.add_sync_target(GuildId(4));
            store.community_mut(GuildId(4)).log_channel_id = Some(ChannelId(40));
        }

        let outcomes = propagate_ban(&api, &store, &ban_from_g1("raid")).await;

        let attempted: Vec<GuildId> = api.bans().into_iter().map(|(g, _, _)| g).collect();
        assert_eq!(attempted, vec![GuildId(2), GuildId(4)]);
        assert!(!outcomes[0].succeeded());
        assert!(outcomes[1].succeeded());
        assert_eq!(
            api.logs(),
            vec![(ChannelId(40), "Synced Ban — U1#0001".to_string())]
        );
    }

    #[tokio::test]
    async fn unreachable_target_is_recorded_not_fatal() {
        let api = FakeApi::new()
            .with_community(1, "A", Permissions::BAN_MEMBERS)
            .with_community(4, "D", Permissions::BAN_MEMBERS);
        let store = shared_store();
        {
            let mut store = store.write().await;
            let a = store.community_mut(GuildId(1));
            a.add_sync_target(GuildId(3));
            a.add_sync_target(GuildId(4));
        }

        let outcomes = propagate_ban(&api, &store, &ban_from_g1("raid")).await;

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(
            outcomes[0].result,
            Err(ModerationError::RemoteCallFailure { .. })
        ));
        assert_eq!(api.bans().len(), 1);
    }

    #[tokio::test]
    async fn no_sync_targets_no_calls() {
        let api = FakeApi::new().with_community(1, "A", Permissions::BAN_MEMBERS);
        let store = shared_store();

        assert!(propagate_ban(&api, &store, &ban_from_g1("x")).await.is_empty());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn mutual_sync_targets_propagate_once() {
        let api = FakeApi::new()
            .with_community(1, "A", Permissions::BAN_MEMBERS)
            .with_community(2, "B", Permissions::BAN_MEMBERS);
        let store = shared_store();
        {
            let mut store = store.write().await;
            store.community_mut(GuildId(1)).add_sync_target(GuildId(2));
            store.community_mut(GuildId(2)).add_sync_target(GuildId(1));
        }

        propagate_ban(&api, &store, &ban_from_g1("x")).await;
        assert_eq!(api.bans().len(), 1);
    }

    #[tokio::test]
    async fn detected_ban_propagates_with_audit_reason() {
        let api = FakeApi::new()
            .with_community(1, "G1", Permissions::BAN_MEMBERS)
            .with_community(2, "G2", Permissions::BAN_MEMBERS)
            .with_audit(
                1,
                BanAuditEntry {
                    executor_id: UserId(900),
                    executor_tag: Some("owner#0001".to_string()),
                    reason: Some("spam".to_string()),
                },
            );
        let store = shared_store();
        {
            let mut store = store.write().await;
            let g1 = store.community_mut(GuildId(1));
            g1.add_sync_target(GuildId(2));
            g1.log_channel_id = Some(ChannelId(10));
        }

        let outcomes = on_ban_detected(
            &api,
            &store,
            CommunityHandle {
                id: GuildId(1),
                name: "G1".to_string(),
            },
            TargetUser {
                id: UserId(501),
                tag: "U1#0001".to_string(),
            },
        )
        .await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            api.bans(),
            vec![(GuildId(2), UserId(501), "Synced ban from G1: spam".to_string())]
        );
        assert_eq!(
            api.logs(),
            vec![(ChannelId(10), "User Banned (Detected) — U1#0001".to_string())]
        );
    }

    #[tokio::test]
    async fn bans_issued_by_the_bot_are_not_propagated_again() {
        let api = FakeApi::new()
            .with_community(1, "G1", Permissions::BAN_MEMBERS)
            .with_community(2, "G2", Permissions::BAN_MEMBERS)
            .with_audit(
                2,
                BanAuditEntry {
                    executor_id: BOT_ID,
                    executor_tag: Some("AutoBanNet#0001".to_string()),
                    reason: Some("Synced ban from G1: spam".to_string()),
                },
            );
        let store = shared_store();
        {
            let mut store = store.write().await;
            store.community_mut(GuildId(1)).add_sync_target(GuildId(2));
            store.community_mut(GuildId(2)).add_sync_target(GuildId(1));
        }

        let outcomes = on_ban_detected(
            &api,
            &store,
            CommunityHandle {
                id: GuildId(2),
                name: "G2".to_string(),
            },
            TargetUser::from_id(UserId(501)),
        )
        .await;

        assert!(outcomes.is_empty());
        assert!(api.bans().is_empty());
    }

    #[tokio::test]
    async fn missing_audit_entry_still_propagates() {
        let api = FakeApi::new()
            .with_community(1, "G1", Permissions::BAN_MEMBERS)
            .with_community(2, "G2", Permissions::BAN_MEMBERS);
        let store = shared_store();
        store.write().await.community_mut(GuildId(1)).add_sync_target(GuildId(2));

        on_ban_detected(
            &api,
            &store,
            CommunityHandle {
                id: GuildId(1),
                name: "G1".to_string(),
            },
            TargetUser::from_id(UserId(501)),
        )
        .await;

        assert_eq!(
            api.bans(),
            vec![(GuildId(2), UserId(501), "Synced ban from G1: No reason".to_string())]
        );
    }

    #[tokio::test]
    async fn synced_bans_do_not_cascade_without_audit_entries() {
        let api = FakeApi::new()
            .with_community(1, "G1", Permissions::BAN_MEMBERS)
            .with_community(2, "G2", Permissions::BAN_MEMBERS)
            .with_community(3, "G3", Permissions::BAN_MEMBERS);
        let store = shared_store();
        {
            let mut store = store.write().await;
            store.community_mut(GuildId(1)).add_sync_target(GuildId(2));
            store.community_mut(GuildId(2)).add_sync_target(GuildId(3));
        }

        propagate_ban(&api, &store, &ban_from_g1("spam")).await;
        let outcomes = on_ban_detected(
            &api,
            &store,
            CommunityHandle {
                id: GuildId(2),
                name: "G2".to_string(),
            },
            TargetUser::from_id(UserId(501)),
        )
        .await;

        assert!(outcomes.is_empty());
        assert_eq!(
            api.bans(),
            vec![(GuildId(2), UserId(501), "Synced ban from G1: spam".to_string())]
        );
        assert!(!api.calls().contains(&ApiCall::RecentBan {
            community: GuildId(2),
            user: UserId(501),
        }));
    }

    #[tokio::test]
    async fn failed_synced_ban_is_not_remembered() {
        let api = FakeApi::new()
            .with_community(1, "G1", Permissions::BAN_MEMBERS)
            .with_community(2, "G2", Permissions::BAN_MEMBERS)
            .failing_ban(2);
        let store = shared_store();
        store.write().await.community_mut(GuildId(1)).add_sync_target(GuildId(2));

        propagate_ban(&api, &store, &ban_from_g1("spam")).await;

        assert!(!api.issued_bans().take(GuildId(2), UserId(501)));
    }

    #[test]
    fn missing_reason_is_spelled_out() {
        assert_eq!(synced_reason("G1", None), "Synced ban from G1: No reason");
    }
}
