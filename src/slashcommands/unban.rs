use crate::error::ModerationError;
use crate::moderation::api::TargetUser;
use crate::moderation::executor::{execute_unban, ActionRequest};
use crate::moderation::notifier::{notify, LogRecord};
use crate::slashcommands::options;
use crate::slashcommands::{reply_outcome, Invocation, Reply};
use anyhow::Result;
use serenity::builder::CreateApplicationCommand;
use serenity::model::id::UserId;
use serenity::model::prelude::command::CommandOptionType;
use serenity::model::prelude::interaction::application_command::CommandDataOption;
use tracing::error;

#[derive(Debug, Clone)]
pub struct UnbanArgs {
    pub user_id: UserId,
    pub reason: Option<String>,
}

pub fn register(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("unban")
        .description("Unban a user by ID (restricted to moderation roles)")
        .create_option(|option| {
            option
                .name("userid")
                .description("User ID to unban")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("reason")
                .description("Reason for unban")
                .kind(CommandOptionType::String)
                .required(false)
        })
}

pub fn parse(options: &[CommandDataOption]) -> Result<UnbanArgs, ModerationError> {
    let raw = options::string(options, "userid")
        .ok_or_else(|| ModerationError::InvalidTarget("Please provide a user ID.".to_string()))?;
    Ok(UnbanArgs {
        user_id: options::user_id(&raw)?,
        reason: options::string(options, "reason"),
    })
}

pub async fn run(inv: &Invocation<'_>, args: UnbanArgs, reply: &mut dyn Reply) -> Result<()> {
    if let Err(why) = inv.require_moderator().await {
        return reply.reject(&why).await;
    }

    let request = ActionRequest {
        community: inv.community.clone(),
        target: TargetUser::from_id(args.user_id),
        moderator_tag: inv.invoker.tag.clone(),
        reason: args
            .reason
            .unwrap_or_else(|| format!("Unban by {}", inv.invoker.tag)),
    };

    match execute_unban(inv.api, &request).await {
        Ok(outcome) => {
            let record = LogRecord::from(&outcome);
            let sent = reply_outcome(reply, record.clone()).await;
            notify(inv.api, inv.store, inv.community.id, &record).await;
            sent
        }
        Err(why) => {
            error!("Unban failed: {}", why);
            reply.reject(&why).await
        }
    }
}
