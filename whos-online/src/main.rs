mod whos_online;

use self::whos_online::commands::Reply;
use self::whos_online::config::Config;
use self::whos_online::connectors::discord::serenity::{
    Context, Data, SerenityDiscordConnector, presence_change, roster_from_guild, server_member,
};
use self::whos_online::notifier::{self, PresenceNotifier};
use self::whos_online::presence::{PresenceStatus, PresenceTracker};
use self::whos_online::settings::SettingsStore;
use crate::whos_online::{WhosOnline, WhosOnlineImpl};
use poise::serenity_prelude as serenity;
use poise::serenity_prelude::FullEvent;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Show who is online in this server right now
#[poise::command(slash_command, guild_only)]
async fn online(ctx: Context<'_>) -> anyhow::Result<()> {
    ctx.defer().await?;
    let guild_id = guild_id(ctx)?;
    let connector = SerenityDiscordConnector::new(ctx.serenity_context().clone());
    let whos_online = whos_online(ctx, &connector);
    send_reply(ctx, whos_online.online(guild_id).await?).await
}

/// Set the channel for automatic online member updates
#[poise::command(
    slash_command,
    rename = "setchannel",
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
async fn set_channel(
    ctx: Context<'_>,
    #[description = "The channel to post updates in"]
    #[channel_types("Text")]
    channel: serenity::GuildChannel,
) -> anyhow::Result<()> {
    let guild_id = guild_id(ctx)?;
    let connector = SerenityDiscordConnector::new(ctx.serenity_context().clone());
    let whos_online = whos_online(ctx, &connector);
    let reply = whos_online.set_channel(guild_id, channel.id.get()).await?;
    send_reply(ctx, reply).await
}

/// Stop automatic online member updates in this server
#[poise::command(
    slash_command,
    rename = "removechannel",
    guild_only,
    required_permissions = "ADMINISTRATOR",
    default_member_permissions = "ADMINISTRATOR"
)]
async fn remove_channel(ctx: Context<'_>) -> anyhow::Result<()> {
    let guild_id = guild_id(ctx)?;
    let connector = SerenityDiscordConnector::new(ctx.serenity_context().clone());
    let whos_online = whos_online(ctx, &connector);
    send_reply(ctx, whos_online.remove_channel(guild_id).await?).await
}

/// Only announce status changes of members with this role
#[poise::command(
    slash_command,
    rename = "setrole",
    guild_only,
    required_permissions = "MANAGE_ROLES",
    default_member_permissions = "MANAGE_ROLES"
)]
async fn set_role(
    ctx: Context<'_>,
    #[description = "The role to monitor"] role: serenity::Role,
) -> anyhow::Result<()> {
    let guild_id = guild_id(ctx)?;
    let connector = SerenityDiscordConnector::new(ctx.serenity_context().clone());
    let whos_online = whos_online(ctx, &connector);
    send_reply(ctx, whos_online.set_role(guild_id, role.id.get()).await?).await
}

/// Announce status changes of every member again
#[poise::command(
    slash_command,
    rename = "removerole",
    guild_only,
    required_permissions = "MANAGE_ROLES",
    default_member_permissions = "MANAGE_ROLES"
)]
async fn remove_role(ctx: Context<'_>) -> anyhow::Result<()> {
    let guild_id = guild_id(ctx)?;
    let connector = SerenityDiscordConnector::new(ctx.serenity_context().clone());
    let whos_online = whos_online(ctx, &connector);
    send_reply(ctx, whos_online.remove_role(guild_id).await?).await
}

/// Check whether your status changes trigger notifications
#[poise::command(slash_command, rename = "checkrole", guild_only)]
async fn check_role(ctx: Context<'_>) -> anyhow::Result<()> {
    let guild_id = guild_id(ctx)?;
    let Some(author) = ctx.author_member().await else {
        return send_reply(ctx, Reply::private(MEMBER_LOOKUP_FAILED)).await;
    };
    let member = server_member(&author, PresenceStatus::default());
    let connector = SerenityDiscordConnector::new(ctx.serenity_context().clone());
    let whos_online = whos_online(ctx, &connector);
    send_reply(ctx, whos_online.check_role(guild_id, &member).await?).await
}

/// Send a test notification to the configured channel
#[poise::command(
    slash_command,
    rename = "testnotify",
    guild_only,
    required_permissions = "MANAGE_ROLES",
    default_member_permissions = "MANAGE_ROLES"
)]
async fn test_notify(ctx: Context<'_>) -> anyhow::Result<()> {
    let guild_id = guild_id(ctx)?;
    let connector = SerenityDiscordConnector::new(ctx.serenity_context().clone());
    let whos_online = whos_online(ctx, &connector);
    send_reply(ctx, whos_online.test_notify(guild_id).await?).await
}

/// Send yourself the DM members with the target role get when someone comes online
#[poise::command(slash_command, rename = "testdm", guild_only)]
async fn test_dm(ctx: Context<'_>) -> anyhow::Result<()> {
    ctx.defer_ephemeral().await?;
    let guild_name = ctx
        .guild()
        .map(|guild| guild.name.clone())
        .unwrap_or_else(|| "this server".to_string());
    let Some(author) = ctx.author_member().await else {
        return send_reply(ctx, Reply::private(MEMBER_LOOKUP_FAILED)).await;
    };
    let member = server_member(&author, PresenceStatus::default());
    let connector = SerenityDiscordConnector::new(ctx.serenity_context().clone());
    let whos_online = whos_online(ctx, &connector);
    send_reply(ctx, whos_online.test_dm(&guild_name, &member).await?).await
}

const MEMBER_LOOKUP_FAILED: &str = "❌ I couldn't look up your membership in this server.";

fn whos_online<'a>(
    ctx: Context<'a>,
    connector: &'a SerenityDiscordConnector,
) -> WhosOnlineImpl<'a, SerenityDiscordConnector> {
    let data = ctx.data();
    WhosOnlineImpl::new(&data.settings, connector, data.update_interval)
}

fn guild_id(ctx: Context<'_>) -> anyhow::Result<u64> {
    ctx.guild_id()
        .map(|guild_id| guild_id.get())
        .ok_or_else(|| {
            anyhow::anyhow!("Command {} used outside of a server", ctx.command().name)
        })
}

async fn send_reply(ctx: Context<'_>, reply: Reply) -> anyhow::Result<()> {
    ctx.send(
        poise::CreateReply::default()
            .content(reply.content)
            .ephemeral(reply.ephemeral),
    )
    .await?;
    Ok(())
}

/// Seeds the presence baseline of a guild that became available
async fn on_guild_create(ctx: &serenity::Context, guild: &serenity::Guild, data: &Data) {
    let roster = roster_from_guild(guild);
    let connector = SerenityDiscordConnector::new(ctx.clone());
    PresenceNotifier::new(&data.settings, &data.presences, &connector)
        .seed_guild(guild.id.get(), &roster)
        .await;
}

async fn on_presence_update(ctx: &serenity::Context, presence: &serenity::Presence, data: &Data) {
    let Some(change) = presence_change(&ctx.cache, presence) else {
        return;
    };
    let guild_id = change.guild_id;
    let connector = SerenityDiscordConnector::new(ctx.clone());
    let notifier = PresenceNotifier::new(&data.settings, &data.presences, &connector);
    if let Err(e) = notifier.handle_presence_update(change).await {
        warn!("Cannot announce presence change in guild {}: {:?}", guild_id, e);
    }
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, Data, anyhow::Error>,
    data: &Data,
) -> anyhow::Result<()> {
    match event {
        FullEvent::GuildCreate { guild, .. } => on_guild_create(ctx, guild, data).await,
        FullEvent::PresenceUpdate { new_data } => on_presence_update(ctx, new_data, data).await,
        FullEvent::GuildDelete { incomplete, .. } => {
            info!("Left or lost guild {}", incomplete.id);
            data.presences.lock().await.forget_guild(incomplete.id.get());
        }
        _ => debug!("Unhandled event: {}", event.snake_case_name()),
    }
    Ok(())
}

async fn on_error(error: poise::FrameworkError<'_, Data, anyhow::Error>) {
    if let poise::FrameworkError::Command { error, ctx, .. } = &error {
        error!("Command /{} failed: {:?}", ctx.command().name, error);
    }
    if let Err(e) = poise::builtins::on_error(error).await {
        error!("Cannot report error to Discord: {}", e);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("whos_online=info,warn")),
        )
        .init();

    let config = Config::new()?;
    let settings = Arc::new(Mutex::new(SettingsStore::load(&config.settings_file)));
    let presences = Arc::new(Mutex::new(PresenceTracker::new()));
    let update_interval = config.update_interval();
    let send_delay = config.send_delay();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_PRESENCES;

    let framework = poise::Framework::<Data, anyhow::Error>::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                online(),
                set_channel(),
                remove_channel(),
                set_role(),
                remove_role(),
                check_role(),
                test_notify(),
                test_dm(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                ctx.set_presence(
                    Some(serenity::ActivityData::watching("Who's Online")),
                    serenity::OnlineStatus::DoNotDisturb,
                );
                info!("Logged in as {} in {} guilds", ready.user.name, ready.guilds.len());

                let summaries = notifier::start(
                    SerenityDiscordConnector::new(ctx.clone()),
                    Arc::clone(&settings),
                    Arc::clone(&presences),
                    update_interval,
                    send_delay,
                );
                tokio::spawn(async move {
                    if let Err(e) = summaries.await {
                        error!("Periodic summaries stopped: {}", e);
                    }
                });
                Ok(Data {
                    settings,
                    presences,
                    update_interval,
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot...");
    client.start().await?;
    Ok(())
}
