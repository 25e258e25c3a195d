//! Wrapper around chat clients.

use crate::{
    base::{
        config::Config,
        types::{ChannelMeta, EmojiRef, LazyMessage, MessageRef, Notification, Polarity, RawReaction, Res, UserRef, Void},
    },
    interaction,
};
use async_trait::async_trait;
use serenity::{
    builder::{CreateEmbed, CreateEmbedFooter, CreateMessage},
    client::{ClientBuilder, Context, EventHandler},
    http::{Http, HttpError},
    model::{
        Timestamp,
        channel::{Channel, Reaction, ReactionType},
        gateway::{GatewayIntents, Ready},
        id::{ChannelId, GuildId, MessageId},
        user::User,
    },
};
use tracing::{error, info, instrument};

use std::{ops::Deref, sync::Arc};

// Traits.

/// Generic "chat" trait that clients must implement.
#[async_trait]
pub trait GenericChatClient {
    /// Get the bot user ID.
    fn bot_user_id(&self) -> u64;
    /// Start the chat client listener.
    async fn start(&self) -> Void;
    /// Fetch a message by its channel and message ids.
    async fn fetch_message(&self, channel_id: u64, message_id: u64) -> Res<MessageRef>;
    /// Look up a channel by id. Returns `Ok(None)` when the platform knows
    /// no such channel.
    async fn fetch_channel(&self, channel_id: u64) -> Res<Option<ChannelMeta>>;
    /// Send a notification to a channel as a single embed message.
    async fn send_notification(&self, channel_id: u64, notification: &Notification) -> Void;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient + Send + Sync + 'static>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient + Send + Sync + 'static;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    /// Wraps any chat client implementation.
    pub fn new(inner: Arc<dyn GenericChatClient + Send + Sync + 'static>) -> Self {
        Self { inner }
    }

    /// Creates a new Discord chat client.
    pub async fn discord(config: &Config) -> Res<Self> {
        let client = DiscordChatClient::new(config).await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

impl From<DiscordChatClient> for ChatClient {
    fn from(client: DiscordChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Specific implementations.

/// Discord client implementation.
#[derive(Clone)]
struct DiscordChatClient {
    config: Config,
    bot_user_id: u64,
    http: Arc<Http>,
}

impl DiscordChatClient {
    /// Create a new Discord chat client.
    #[instrument(name = "DiscordChatClient::new", skip_all)]
    pub async fn new(config: &Config) -> Res<Self> {
        // Initialize the REST client and verify the token against the platform.

        let http = Arc::new(Http::new(&config.discord_token));

        let bot_user = http.get_current_user().await?;
        let bot_user_id = bot_user.id.get();

        info!("Discord bot user: {}", bot_user.tag());

        Ok(Self {
            config: config.clone(),
            bot_user_id,
            http,
        })
    }
}

#[async_trait]
impl GenericChatClient for DiscordChatClient {
    fn bot_user_id(&self) -> u64 {
        self.bot_user_id
    }

    async fn start(&self) -> Void {
        // The original bot declares message-content access alongside the
        // reaction intents, so partial message stubs can be hydrated.
        let intents = GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::GUILD_MESSAGE_REACTIONS | GatewayIntents::MESSAGE_CONTENT;

        let handler = DiscordEventHandler {
            config: self.config.clone(),
            chat: ChatClient::from(self.clone()),
        };

        let mut client = ClientBuilder::new_with_http(self.http.clone(), intents).event_handler(handler).await?;

        // Shut the shards down cleanly on Ctrl-C.
        let shard_manager = client.shard_manager.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.expect("Could not register the Ctrl-C handler");
            shard_manager.shutdown_all().await;
        });

        client.start().await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_message(&self, channel_id: u64, message_id: u64) -> Res<MessageRef> {
        let message = self.http.get_message(ChannelId::new(channel_id), MessageId::new(message_id)).await?;

        Ok(MessageRef {
            id: message.id.get(),
            channel_id: message.channel_id.get(),
            guild_id: message.guild_id.map(GuildId::get),
        })
    }

    #[instrument(skip(self))]
    async fn fetch_channel(&self, channel_id: u64) -> Res<Option<ChannelMeta>> {
        let channel = match self.http.get_channel(ChannelId::new(channel_id)).await {
            Ok(channel) => channel,
            Err(serenity::Error::Http(HttpError::UnsuccessfulRequest(response))) if response.status_code.as_u16() == 404 => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let meta = match channel {
            Channel::Guild(channel) => ChannelMeta {
                id: channel.id.get(),
                name: Some(channel.name),
            },
            Channel::Private(channel) => ChannelMeta { id: channel.id.get(), name: None },
            _ => ChannelMeta { id: channel_id, name: None },
        };

        Ok(Some(meta))
    }

    #[instrument(skip(self, notification))]
    async fn send_notification(&self, channel_id: u64, notification: &Notification) -> Void {
        let mut embed = CreateEmbed::new()
            .colour(notification.color)
            .title(&notification.title)
            .description(&notification.description)
            .timestamp(Timestamp::from_unix_timestamp(notification.timestamp.timestamp())?)
            .footer(CreateEmbedFooter::new(&notification.footer));

        for field in &notification.fields {
            embed = embed.field(&field.label, &field.value, field.inline);
        }

        if let Some(url) = &notification.thumbnail_url {
            embed = embed.thumbnail(url);
        }

        ChannelId::new(channel_id).send_message(&self.http, CreateMessage::new().embed(embed)).await?;

        Ok(())
    }
}

// Gateway event handler for Discord.

/// Adapts gateway callbacks into the shared reaction pipeline.
struct DiscordEventHandler {
    config: Config,
    chat: ChatClient,
}

#[async_trait]
impl EventHandler for DiscordEventHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Connected to Discord as {}", ready.user.tag());
    }

    async fn reaction_add(&self, ctx: Context, reaction: Reaction) {
        self.relay(&ctx, &reaction, Polarity::Added).await;
    }

    async fn reaction_remove(&self, ctx: Context, reaction: Reaction) {
        self.relay(&ctx, &reaction, Polarity::Removed).await;
    }
}

impl DiscordEventHandler {
    /// Converts a gateway reaction into raw domain types and hands it to the
    /// pipeline. Both polarities funnel through here.
    #[instrument(skip(self, ctx, reaction))]
    async fn relay(&self, ctx: &Context, reaction: &Reaction, polarity: Polarity) {
        let actor = match raw_actor(ctx, reaction).await {
            Ok(actor) => actor,
            Err(err) => {
                error!("Could not identify the reacting user: {}", err);
                return;
            }
        };

        let raw = raw_reaction(ctx, reaction);

        interaction::reaction_event::handle_reaction_event(raw, actor, polarity, self.config.clone(), self.chat.clone());
    }
}

/// The acting user, taken from the event's member payload when present and
/// fetched otherwise.
async fn raw_actor(ctx: &Context, reaction: &Reaction) -> Res<UserRef> {
    if let Some(member) = &reaction.member {
        return Ok(user_ref(&member.user));
    }

    let user = reaction.user(&ctx.http).await?;

    Ok(user_ref(&user))
}

/// Builds the raw reaction, hydrating from the gateway cache when the
/// message is already known there.
fn raw_reaction(ctx: &Context, reaction: &Reaction) -> RawReaction {
    let message = match ctx.cache.message(reaction.channel_id, reaction.message_id) {
        Some(message) => LazyMessage::Hydrated(MessageRef {
            id: message.id.get(),
            channel_id: message.channel_id.get(),
            guild_id: message.guild_id.or(reaction.guild_id).map(GuildId::get),
        }),
        None => LazyMessage::Ref {
            message_id: reaction.message_id.get(),
            channel_id: reaction.channel_id.get(),
            guild_id: reaction.guild_id.map(GuildId::get),
        },
    };

    RawReaction {
        emoji: emoji_ref(&reaction.emoji),
        message,
    }
}

fn user_ref(user: &User) -> UserRef {
    UserRef {
        id: user.id.get(),
        bot: user.bot,
        avatar_url: user.avatar_url(),
    }
}

fn emoji_ref(emoji: &ReactionType) -> EmojiRef {
    let id = match emoji {
        ReactionType::Custom { id, .. } => Some(id.get()),
        _ => None,
    };

    EmojiRef { id, render: emoji.to_string() }
}
