//! Filters and hydrates raw reaction events.

use tracing::{debug, instrument};

use crate::{
    base::types::{LazyMessage, Polarity, RawReaction, ReactionEvent, ResolutionError, UserRef},
    service::chat::ChatClient,
};

/// Outcome of resolving a raw reaction: either a fully populated event, or
/// a signal that the event is not worth relaying.
#[derive(Debug)]
pub enum Resolution {
    /// The event came from an automated account and is dropped.
    Skip,
    /// The event is fully resolved.
    Event(ReactionEvent),
}

/// Filters out bot-originated events and hydrates the referenced message.
///
/// Hydration fetches are read-only and are not retried; a failure aborts
/// this event only.
#[instrument(skip_all)]
pub async fn resolve(chat: &ChatClient, raw: RawReaction, actor: UserRef, polarity: Polarity) -> Result<Resolution, ResolutionError> {
    if actor.bot || actor.id == chat.bot_user_id() {
        debug!("Skipping reaction from automated account {}", actor.id);
        return Ok(Resolution::Skip);
    }

    let message = match raw.message {
        LazyMessage::Hydrated(message) => message,
        LazyMessage::Ref { message_id, channel_id, guild_id } => {
            let mut message = chat
                .fetch_message(channel_id, message_id)
                .await
                .map_err(|source| ResolutionError { channel_id, message_id, source })?;

            // REST message payloads omit the guild id; keep the gateway's.
            message.guild_id = message.guild_id.or(guild_id);

            message
        }
    };

    Ok(Resolution::Event(ReactionEvent {
        polarity,
        emoji: raw.emoji,
        actor,
        message,
    }))
}
