use crate::error::ModerationError;
use crate::moderation::api::TargetUser;
use crate::moderation::executor::{execute_kick, ActionRequest};
use crate::moderation::notifier::{notify, LogRecord};
use crate::slashcommands::options;
use crate::slashcommands::{reply_outcome, Invocation, Reply};
use anyhow::Result;
use serenity::builder::CreateApplicationCommand;
use serenity::model::prelude::command::CommandOptionType;
use serenity::model::prelude::interaction::application_command::CommandDataOption;
use tracing::error;

#[derive(Debug, Clone)]
pub struct KickArgs {
    pub target: TargetUser,
    pub reason: Option<String>,
}

pub fn register(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("kick")
        .description("Kick a user (restricted to moderation roles)")
        .create_option(|option| {
            option
                .name("user")
                .description("User to kick")
                .kind(CommandOptionType::User)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("reason")
                .description("Reason for kick")
                .kind(CommandOptionType::String)
                .required(false)
        })
}

pub fn parse(options: &[CommandDataOption]) -> Result<KickArgs, ModerationError> {
    let target = options::user(options, "user")
        .ok_or_else(|| ModerationError::InvalidTarget("Please provide a user to target.".to_string()))?;
    Ok(KickArgs {
        target,
        reason: options::string(options, "reason"),
    })
}

pub async fn run(inv: &Invocation<'_>, args: KickArgs, reply: &mut dyn Reply) -> Result<()> {
    if let Err(why) = inv.require_moderator().await {
        return reply.reject(&why).await;
    }

    let request = ActionRequest {
        community: inv.community.clone(),
        target: args.target,
        moderator_tag: inv.invoker.tag.clone(),
        reason: args
            .reason
            .unwrap_or_else(|| format!("Action by {}", inv.invoker.tag)),
    };

    match execute_kick(inv.api, &request).await {
        Ok(outcome) => {
            let record = LogRecord::from(&outcome);
            let sent = reply_outcome(reply, record.clone()).await;
            notify(inv.api, inv.store, inv.community.id, &record).await;
            sent
        }
        Err(why) => {
            error!("Kick failed: {}", why);
            reply.reject(&why).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moderation::testing::{member, shared_store, FakeApi};
    use crate::slashcommands::testing::{invocation, FailingReply, RecordedReply};
    use serenity::model::id::{ChannelId, GuildId, UserId};
    use serenity::model::permissions::Permissions;

    fn args() -> KickArgs {
        KickArgs {
            target: TargetUser {
                id: UserId(501),
                tag: "U1#0001".to_string(),
            },
            reason: None,
        }
    }

    #[tokio::test]
    async fn kicks_current_member() {
        let api = FakeApi::new()
            .with_community(1, "G1", Permissions::KICK_MEMBERS)
            .with_member(1, member(UserId(501), 2, Permissions::empty()));
        let store = shared_store();
        let inv = invocation(&api, &store, Permissions::ADMINISTRATOR);
        let mut reply = RecordedReply::default();

        run(&inv, args(), &mut reply).await.unwrap();

        let record = reply.only();
        assert_eq!(record.title, "User Kicked — U1#0001");
        assert_eq!(record.field_value("Reason"), Some("Action by mod#0077"));
    }

    #[tokio::test]
    async fn absent_member_is_reported() {
        let api = FakeApi::new().with_community(1, "G1", Permissions::KICK_MEMBERS);
        let store = shared_store();
        let inv = invocation(&api, &store, Permissions::ADMINISTRATOR);
        let mut reply = RecordedReply::default();

        run(&inv, args(), &mut reply).await.unwrap();

        assert_eq!(reply.only().title, "Not In Server");
    }

    #[tokio::test]
    async fn failed_reply_still_logs() {
        let api = FakeApi::new()
            .with_community(1, "G1", Permissions::KICK_MEMBERS)
            .with_member(1, member(UserId(501), 2, Permissions::empty()));
        let store = shared_store();
        store.write().await.community_mut(GuildId(1)).log_channel_id = Some(ChannelId(10));
        let inv = invocation(&api, &store, Permissions::ADMINISTRATOR);

        assert!(run(&inv, args(), &mut FailingReply::default()).await.is_err());
        assert_eq!(
            api.logs(),
            vec![(ChannelId(10), "User Kicked — U1#0001".to_string())]
        );
    }
}
