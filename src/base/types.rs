//! Shared domain types for the reaction pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Boxed error type used at the outer boundary of the application.
pub type Err = anyhow::Error;
/// Result alias over [`Err`].
pub type Res<T> = Result<T, Err>;
/// Result alias for operations that only signal success or failure.
pub type Void = Res<()>;

/// Whether a reaction was added to or removed from a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    /// The reaction was added.
    Added,
    /// The reaction was removed.
    Removed,
}

/// An emoji as it appeared on the reaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiRef {
    /// Custom-emoji id, if the emoji is guild-custom rather than unicode.
    pub id: Option<u64>,
    /// Renderable form: the unicode glyph, or `<:name:id>` / `<a:name:id>`
    /// for custom emojis.
    pub render: String,
}

/// The user that performed the reaction change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    /// The user's id.
    pub id: u64,
    /// Whether the account is automated.
    pub bot: bool,
    /// The user's avatar URL, if one is set.
    pub avatar_url: Option<String>,
}

/// A fully materialized message reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    /// The message id.
    pub id: u64,
    /// The id of the channel containing the message.
    pub channel_id: u64,
    /// The id of the guild containing the channel, absent for direct messages.
    pub guild_id: Option<u64>,
}

impl MessageRef {
    /// Canonical link to the message. Direct messages use `@me` in the
    /// guild position.
    pub fn link(&self) -> String {
        let guild = self.guild_id.map_or_else(|| "@me".to_string(), |id| id.to_string());

        format!("https://discord.com/channels/{}/{}/{}", guild, self.channel_id, self.id)
    }
}

/// A message handle as delivered by the gateway: either a bare id stub
/// whose fields beyond the key must not be trusted, or an already
/// materialized [`MessageRef`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LazyMessage {
    /// Only the ids are known; the message must be fetched before use.
    Ref {
        /// The message id.
        message_id: u64,
        /// The id of the channel containing the message.
        channel_id: u64,
        /// The guild id as reported by the gateway, if any.
        guild_id: Option<u64>,
    },
    /// The message is fully materialized.
    Hydrated(MessageRef),
}

impl LazyMessage {
    /// The message id, known in both states.
    pub fn message_id(&self) -> u64 {
        match self {
            Self::Ref { message_id, .. } => *message_id,
            Self::Hydrated(message) => message.id,
        }
    }
}

/// A reaction change as handed over by the platform adapter, before
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReaction {
    /// The emoji involved in the change.
    pub emoji: EmojiRef,
    /// The message the reaction targets, possibly unhydrated.
    pub message: LazyMessage,
}

/// A fully resolved reaction event, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEvent {
    /// Whether the reaction was added or removed.
    pub polarity: Polarity,
    /// The emoji involved.
    pub emoji: EmojiRef,
    /// The user that performed the change.
    pub actor: UserRef,
    /// The message the reaction targets.
    pub message: MessageRef,
}

/// A single labeled value on a [`Notification`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationField {
    /// Field label, including its icon.
    pub label: String,
    /// Field value.
    pub value: String,
    /// Whether the field renders inline.
    pub inline: bool,
}

/// The structured notification delivered to the log channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Accent color as a 24-bit RGB value.
    pub color: u32,
    /// Notification title.
    pub title: String,
    /// Body text referencing the message link.
    pub description: String,
    /// Labeled detail fields, in render order.
    pub fields: Vec<NotificationField>,
    /// Render time.
    pub timestamp: DateTime<Utc>,
    /// Footer text.
    pub footer: String,
    /// Thumbnail image URL, omitted entirely when the actor has no avatar.
    pub thumbnail_url: Option<String>,
}

/// A destination channel as resolved by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMeta {
    /// The channel id.
    pub id: u64,
    /// The channel name, absent for direct-message channels.
    pub name: Option<String>,
}

/// Hydrating a partial message reference failed.
#[derive(Debug, thiserror::Error)]
#[error("could not hydrate message {message_id} in channel {channel_id}")]
pub struct ResolutionError {
    /// The channel the fetch targeted.
    pub channel_id: u64,
    /// The message the fetch targeted.
    pub message_id: u64,
    /// The underlying platform error.
    #[source]
    pub source: Err,
}

/// Delivering a notification to the log channel failed.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The destination channel does not exist on the platform.
    #[error("log channel {0} does not exist")]
    ChannelMissing(u64),
    /// The channel lookup or the send itself failed.
    #[error("could not deliver notification to channel {channel_id}")]
    Delivery {
        /// The channel the delivery targeted.
        channel_id: u64,
        /// The underlying platform error.
        #[source]
        source: Err,
    },
}
