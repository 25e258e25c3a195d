//! Per-event pipeline: resolve, render, dispatch.

use tracing::{Instrument, debug, error, instrument, warn};

use crate::{
    base::{
        config::Config,
        types::{DispatchError, Notification, Polarity, RawReaction, UserRef, Void},
    },
    interaction::{render, resolver},
    service::chat::ChatClient,
};

/// Handles a single reaction change event.
///
/// Spawns an independent task for the event so that a slow or failing
/// delivery never blocks the gateway event loop or another event's
/// processing. Errors are logged here and go no further.
#[instrument(skip_all)]
pub fn handle_reaction_event(raw: RawReaction, actor: UserRef, polarity: Polarity, config: Config, chat: ChatClient) {
    tokio::spawn(async move {
        let message_id = raw.message.message_id();

        // Process the event.
        let result = handle_reaction_event_internal(raw, actor, polarity, &config, &chat).in_current_span().await;

        // Log any errors.
        if let Err(err) = &result {
            error!("Error while handling {:?} reaction on message {}: {:#}", polarity, message_id, err);
        }
    });
}

#[instrument(skip_all)]
async fn handle_reaction_event_internal(raw: RawReaction, actor: UserRef, polarity: Polarity, config: &Config, chat: &ChatClient) -> Void {
    // Filter and hydrate.

    let event = match resolver::resolve(chat, raw, actor, polarity).await? {
        resolver::Resolution::Skip => return Ok(()),
        resolver::Resolution::Event(event) => event,
    };

    // Render and deliver.

    let notification = render::render(&event, &config.style);

    match dispatch(chat, &notification, config.log_channel_id).await {
        Ok(()) => Ok(()),
        Err(DispatchError::ChannelMissing(channel_id)) => {
            // A missing log channel is never fatal to the process.
            warn!("Log channel {} not found, dropping notification", channel_id);
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Delivers a notification to the destination channel.
///
/// The channel is resolved by id on every delivery; the platform API is the
/// final arbiter of ordering between concurrent sends.
#[instrument(skip(chat, notification))]
pub async fn dispatch(chat: &ChatClient, notification: &Notification, channel_id: u64) -> Result<(), DispatchError> {
    let channel = chat
        .fetch_channel(channel_id)
        .await
        .map_err(|source| DispatchError::Delivery { channel_id, source })?
        .ok_or(DispatchError::ChannelMissing(channel_id))?;

    if let Ok(payload) = serde_json::to_string(notification) {
        debug!("Delivering to #{}: {}", channel.name.as_deref().unwrap_or("unknown"), payload);
    }

    chat.send_notification(channel.id, notification)
        .await
        .map_err(|source| DispatchError::Delivery { channel_id, source })?;

    Ok(())
}
