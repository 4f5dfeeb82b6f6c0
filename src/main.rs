use anyhow::anyhow;
use serenity::async_trait;
use serenity::model::application::command::Command;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::Interaction;
use serenity::model::event::ResumedEvent;
use serenity::model::gateway::{Activity, Ready};
use serenity::model::guild::{Guild, Member};
use serenity::model::id::GuildId;
use serenity::model::user::User;
use serenity::prelude::*;
use shuttle_secrets::SecretStore;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
mod data;
mod error;
mod moderation;
mod scheduler;
mod slashcommands;
mod utils;
use crate::data::store::{ConfigStore, SharedStore};
use crate::moderation::api::{CommunityHandle, ModerationApi, TargetUser};
use crate::moderation::denylist::{check_member_join, MemberJoin};
use crate::moderation::issued::IssuedBans;
use crate::moderation::permission::Actor;
use crate::moderation::propagation::on_ban_detected;
use crate::moderation::serenity_api::SerenityApi;
use crate::slashcommands::{ban, kick, setup, unban};
use crate::slashcommands::{InteractionReply, Invocation, Reply};
use crate::utils::embeds;

const PRESENCE: &str = "Protecting servers • AutoBanNet";

struct Bot {
    store: SharedStore,
    issued: Arc<IssuedBans>,
    test_guild: Option<GuildId>,
    scheduler_started: AtomicBool,
}

impl Bot {
    fn community(api: &SerenityApi, id: GuildId) -> CommunityHandle {
        api.community(id).unwrap_or_else(|| CommunityHandle {
            id,
            name: id.to_string(),
        })
    }

    async fn register_commands(&self, ctx: &Context) {
        match self.test_guild {
            Some(guild) => {
                match guild
                    .set_application_commands(&ctx.http, |commands| {
                        slashcommands::register_all(commands)
                    })
                    .await
                {
                    Ok(commands) => info!("Registered {} commands in test guild {}", commands.len(), guild),
                    Err(why) => error!("Could not register commands in {}: {}", guild, why),
                }

                // Global copies would show up twice in the test guild.
                if let Ok(global) = Command::get_global_application_commands(&ctx.http).await {
                    for command in global
                        .iter()
                        .filter(|c| slashcommands::COMMAND_NAMES.contains(&c.name.as_str()))
                    {
                        if let Err(why) =
                            Command::delete_global_application_command(&ctx.http, command.id).await
                        {
                            warn!("Could not remove global command {}: {}", command.name, why);
                        }
                    }
                }
            }
            None => {
                match Command::set_global_application_commands(&ctx.http, |commands| {
                    slashcommands::register_all(commands)
                })
                .await
                {
                    Ok(commands) => info!("Registered {} global commands", commands.len()),
                    Err(why) => error!("Could not register global commands: {}", why),
                }
            }
        }
    }
}

async fn dispatch(
    inv: &Invocation<'_>,
    command: &ApplicationCommandInteraction,
    reply: &mut dyn Reply,
) -> anyhow::Result<()> {
    let options = &command.data.options;
    match command.data.name.as_str() {
        "setup" => match setup::parse(options) {
            Ok(sub) => setup::run(inv, sub, reply).await,
            Err(why) => reply.reject(&why).await,
        },
        "ban" => match ban::parse(options) {
            Ok(args) => ban::run(inv, args, reply).await,
            Err(why) => reply.reject(&why).await,
        },
        "kick" => match kick::parse(options) {
            Ok(args) => kick::run(inv, args, reply).await,
            Err(why) => reply.reject(&why).await,
        },
        "unban" => match unban::parse(options) {
            Ok(args) => unban::run(inv, args, reply).await,
            Err(why) => reply.reject(&why).await,
        },
        other => {
            warn!("Received unknown command {}", other);
            Ok(())
        }
    }
}

#[async_trait]
impl EventHandler for Bot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Connected as {}", ready.user.name);
        ctx.set_activity(Activity::watching(PRESENCE)).await;
        self.register_commands(&ctx).await;

        if !self.scheduler_started.swap(true, Ordering::SeqCst) {
            scheduler::spawn_auto_messages(ctx.http.clone(), self.store.clone());
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::ApplicationCommand(command) = interaction else {
            return;
        };
        debug!("Received command {} from {}", command.data.name, command.user.tag());
        let mut reply = InteractionReply::new(&ctx, &command);

        let (Some(guild_id), Some(member)) = (command.guild_id, command.member.as_ref()) else {
            if let Err(why) = reply
                .send(
                    embeds::error("Server Only", "This command can only be used in a server."),
                    true,
                )
                .await
            {
                warn!("Cannot respond to slash command: {}", why);
            }
            return;
        };

        let api = SerenityApi::new(&ctx, &self.issued);
        let inv = Invocation {
            api: &api,
            store: &self.store,
            community: Bot::community(&api, guild_id),
            invoker: TargetUser {
                id: command.user.id,
                tag: command.user.tag(),
            },
            actor: Actor::from(member),
        };

        if let Err(why) = dispatch(&inv, &command, &mut reply).await {
            slashcommands::report_failure(&mut reply, &command.data.name, &why).await;
        }
    }

    async fn guild_ban_addition(&self, ctx: Context, guild_id: GuildId, banned_user: User) {
        let api = SerenityApi::new(&ctx, &self.issued);
        let community = Bot::community(&api, guild_id);
        let target = TargetUser {
            id: banned_user.id,
            tag: banned_user.tag(),
        };
        on_ban_detected(&api, &self.store, community, target).await;
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        let api = SerenityApi::new(&ctx, &self.issued);
        let join = MemberJoin {
            community: Bot::community(&api, new_member.guild_id),
            user: TargetUser {
                id: new_member.user.id,
                tag: new_member.user.tag(),
            },
        };
        if let Some(hit) = check_member_join(&api, &self.store, &join).await {
            info!(
                "Deny-list hit for {} via {}: {}/{} communities banned",
                join.user.id,
                hit.watched.id,
                hit.sweep.iter().filter(|o| o.succeeded()).count(),
                hit.sweep.len()
            );
        }
    }

    async fn guild_create(&self, _: Context, guild: Guild, is_new: bool) {
        if is_new {
            info!("Joined new guild {} ({})", guild.name, guild.id);
        }
    }

    async fn resume(&self, _: Context, _: ResumedEvent) {
        info!("Resumed");
    }
}

#[shuttle_runtime::main]
async fn serenity(
    #[shuttle_static_folder::StaticFolder(folder = "data")] data_folder: PathBuf,
    #[shuttle_secrets::Secrets] secret_store: SecretStore,
) -> shuttle_serenity::ShuttleSerenity {
    // Get the discord token set in `Secrets.toml`
    let token = if let Some(token) = secret_store.get("DISCORD_TOKEN") {
        token
    } else {
        return Err(anyhow!("'DISCORD_TOKEN' was not found").into());
    };

    let test_guild = match secret_store.get("TEST_GUILD_ID") {
        Some(raw) => Some(
            raw.trim()
                .parse::<u64>()
                .map(GuildId)
                .map_err(|_| anyhow!("'TEST_GUILD_ID' is not a valid id"))?,
        ),
        None => None,
    };
    let config_path = secret_store
        .get("CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| data_folder.join("config.json"));
    let store = Arc::new(RwLock::new(ConfigStore::load(config_path)));

    // Guild events plus the member and ban streams the moderation core reacts to
    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MEMBERS | GatewayIntents::GUILD_BANS;

    let bot = Bot {
        store,
        issued: Arc::new(IssuedBans::default()),
        test_guild,
        scheduler_started: AtomicBool::new(false),
    };
    let client = Client::builder(&token, intents)
        .event_handler(bot)
        .await
        .map_err(|why| anyhow!("Err creating client: {}", why))?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(why) = tokio::signal::ctrl_c().await {
            error!("Could not register ctrl+c handler: {}", why);
            return;
        }
        shard_manager.lock().await.shutdown_all().await;
    });
    Ok(client.into())
}
