//! Renders a resolved reaction event into a notification.

use chrono::Utc;

use crate::base::{
    config::NotifyStyle,
    types::{Notification, NotificationField, Polarity, ReactionEvent},
};

/// Builds the notification for a resolved event.
///
/// The output is fully determined by the event and the style tables; only
/// the timestamp varies between calls. All polarity-dependent content
/// branches on the typed polarity.
pub fn render(event: &ReactionEvent, style: &NotifyStyle) -> Notification {
    let (color, title, verb) = match event.polarity {
        Polarity::Added => (style.colors.added, "Reaction Added", "reacted to"),
        Polarity::Removed => (style.colors.removed, "Reaction Removed", "removed a reaction from"),
    };

    let (member_icon, emoji_icon) = match event.polarity {
        Polarity::Added => (&style.icons.member_added, &style.icons.emoji_added),
        Polarity::Removed => (&style.icons.member_removed, &style.icons.emoji_removed),
    };

    let link = event.message.link();

    Notification {
        color,
        title: title.to_string(),
        description: format!("> A member {verb} a [message]({link})"),
        fields: vec![
            NotificationField {
                label: format!("{member_icon} Member"),
                value: format!("<@{}>", event.actor.id),
                inline: true,
            },
            NotificationField {
                label: format!("{emoji_icon} Emoji"),
                value: event.emoji.render.clone(),
                inline: true,
            },
        ],
        timestamp: Utc::now(),
        footer: format!("Message ID: {}", event.message.id),
        thumbnail_url: event.actor.avatar_url.clone(),
    }
}
