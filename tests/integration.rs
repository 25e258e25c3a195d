#![cfg(test)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use mockall::mock;
use reaction_bot::{
    base::{
        config::{Config, ConfigInner, NotifyIcons, NotifyStyle},
        types::{ChannelMeta, DispatchError, EmojiRef, LazyMessage, MessageRef, Notification, Polarity, RawReaction, ReactionEvent, Res, UserRef, Void},
    },
    interaction::{
        reaction_event::{dispatch, handle_reaction_event},
        render::render,
        resolver::{Resolution, resolve},
    },
    service::chat::{ChatClient, GenericChatClient},
};

// Mocks.

// Mock chat client for testing.

mock! {
    pub Chat {}

    #[async_trait]
    impl GenericChatClient for Chat {
        fn bot_user_id(&self) -> u64;
        async fn start(&self) -> Void;
        async fn fetch_message(&self, channel_id: u64, message_id: u64) -> Res<MessageRef>;
        async fn fetch_channel(&self, channel_id: u64) -> Res<Option<ChannelMeta>>;
        async fn send_notification(&self, channel_id: u64, notification: &Notification) -> Void;
    }
}

const BOT_USER_ID: u64 = 4242;
const LOG_CHANNEL_ID: u64 = 555;

fn get_mock_chat() -> MockChat {
    let mut mock = MockChat::new();

    mock.expect_bot_user_id().return_const(BOT_USER_ID);

    mock
}

fn test_config() -> Config {
    Config {
        inner: Arc::new(ConfigInner {
            discord_token: "test-token".to_string(),
            log_channel_id: LOG_CHANNEL_ID,
            ..Default::default()
        }),
    }
}

fn fire() -> EmojiRef {
    EmojiRef {
        id: None,
        render: "🔥".to_string(),
    }
}

fn member(id: u64) -> UserRef {
    UserRef {
        id,
        bot: false,
        avatar_url: Some(format!("https://cdn.discordapp.com/avatars/{id}/a.png")),
    }
}

fn hydrated_message() -> MessageRef {
    MessageRef {
        id: 99,
        channel_id: 2,
        guild_id: Some(1),
    }
}

fn hydrated_raw() -> RawReaction {
    RawReaction {
        emoji: fire(),
        message: LazyMessage::Hydrated(hydrated_message()),
    }
}

fn event(polarity: Polarity) -> ReactionEvent {
    ReactionEvent {
        polarity,
        emoji: fire(),
        actor: member(42),
        message: hydrated_message(),
    }
}

// Resolver.

#[tokio::test]
async fn resolve_skips_bot_actors() {
    // No fetch expectations: any hydration attempt would fail the test.
    let chat = ChatClient::new(Arc::new(get_mock_chat()));

    let actor = UserRef {
        id: 7,
        bot: true,
        avatar_url: None,
    };

    let resolution = resolve(&chat, hydrated_raw(), actor, Polarity::Added).await.expect("resolve should not error");

    assert!(matches!(resolution, Resolution::Skip));
}

#[tokio::test]
async fn resolve_skips_the_bots_own_reactions() {
    let chat = ChatClient::new(Arc::new(get_mock_chat()));

    let actor = UserRef {
        id: BOT_USER_ID,
        bot: false,
        avatar_url: None,
    };

    let resolution = resolve(&chat, hydrated_raw(), actor, Polarity::Removed).await.expect("resolve should not error");

    assert!(matches!(resolution, Resolution::Skip));
}

#[tokio::test]
async fn resolve_hydrates_partial_messages() {
    let mut mock = get_mock_chat();

    // The REST payload carries no guild id; the resolver keeps the gateway's.
    mock.expect_fetch_message().withf(|channel_id, message_id| *channel_id == 2 && *message_id == 99).returning(|channel_id, message_id| {
        Ok(MessageRef {
            id: message_id,
            channel_id,
            guild_id: None,
        })
    });

    let chat = ChatClient::new(Arc::new(mock));

    let raw = RawReaction {
        emoji: fire(),
        message: LazyMessage::Ref {
            message_id: 99,
            channel_id: 2,
            guild_id: Some(1),
        },
    };

    let resolution = resolve(&chat, raw, member(42), Polarity::Added).await.expect("resolve should not error");

    let Resolution::Event(event) = resolution else {
        panic!("expected a resolved event");
    };

    assert_eq!(event.message, hydrated_message());
    assert_eq!(event.actor.id, 42);
    assert_eq!(event.polarity, Polarity::Added);
}

#[tokio::test]
async fn resolve_uses_hydrated_messages_without_fetching() {
    // No fetch expectation: a fetch for an already-hydrated message would panic.
    let chat = ChatClient::new(Arc::new(get_mock_chat()));

    let resolution = resolve(&chat, hydrated_raw(), member(42), Polarity::Added).await.expect("resolve should not error");

    assert!(matches!(resolution, Resolution::Event(_)));
}

#[tokio::test]
async fn resolve_surfaces_hydration_failures() {
    let mut mock = get_mock_chat();

    mock.expect_fetch_message().returning(|_, _| Err(anyhow::anyhow!("unknown message")));

    let chat = ChatClient::new(Arc::new(mock));

    let raw = RawReaction {
        emoji: fire(),
        message: LazyMessage::Ref {
            message_id: 99,
            channel_id: 2,
            guild_id: Some(1),
        },
    };

    let err = resolve(&chat, raw, member(42), Polarity::Added).await.expect_err("hydration failure should surface");

    assert_eq!(err.channel_id, 2);
    assert_eq!(err.message_id, 99);
}

// Renderer.

#[test]
fn render_is_deterministic_modulo_timestamp() {
    let style = NotifyStyle::default();

    let mut first = render(&event(Polarity::Added), &style);
    let second = render(&event(Polarity::Added), &style);

    first.timestamp = second.timestamp;

    assert_eq!(first, second);
}

#[test]
fn render_added_reaction() {
    let style = NotifyStyle::default();

    let notification = render(&event(Polarity::Added), &style);

    assert_eq!(notification.color, style.colors.added);
    assert_eq!(notification.title, "Reaction Added");
    assert!(notification.description.contains("reacted to"));
    assert!(notification.description.contains("https://discord.com/channels/1/2/99"));
    assert_eq!(notification.footer, "Message ID: 99");

    assert_eq!(notification.fields.len(), 2);
    assert_eq!(notification.fields[0].value, "<@42>");
    assert!(notification.fields[0].inline);
    assert_eq!(notification.fields[1].value, "🔥");
    assert!(notification.fields[1].inline);
}

#[test]
fn render_removed_reaction() {
    let style = NotifyStyle::default();

    let notification = render(&event(Polarity::Removed), &style);

    assert_eq!(notification.color, style.colors.removed);
    assert_eq!(notification.title, "Reaction Removed");
    assert!(notification.description.contains("removed a reaction from"));
    assert!(notification.description.contains("https://discord.com/channels/1/2/99"));
}

#[test]
fn field_icons_follow_polarity() {
    let style = NotifyStyle {
        icons: NotifyIcons {
            member_added: "MA".to_string(),
            member_removed: "MR".to_string(),
            emoji_added: "EA".to_string(),
            emoji_removed: "ER".to_string(),
        },
        ..Default::default()
    };

    let added = render(&event(Polarity::Added), &style);
    let removed = render(&event(Polarity::Removed), &style);

    assert!(added.fields[0].label.starts_with("MA"));
    assert!(added.fields[1].label.starts_with("EA"));
    assert!(removed.fields[0].label.starts_with("MR"));
    assert!(removed.fields[1].label.starts_with("ER"));
}

#[test]
fn missing_avatar_omits_thumbnail() {
    let style = NotifyStyle::default();

    let mut without_avatar = event(Polarity::Added);
    without_avatar.actor.avatar_url = None;

    assert_eq!(render(&without_avatar, &style).thumbnail_url, None);
    assert!(render(&event(Polarity::Added), &style).thumbnail_url.is_some());
}

#[test]
fn message_link_round_trips() {
    let message = hydrated_message();
    let link = message.link();

    let ids: Vec<u64> = link
        .strip_prefix("https://discord.com/channels/")
        .expect("link should carry the canonical prefix")
        .split('/')
        .map(|part| part.parse().expect("link segments should be numeric"))
        .collect();

    assert_eq!(ids, vec![1, 2, 99]);
}

// Dispatcher.

#[tokio::test]
async fn dispatch_reports_missing_channel() {
    let mut mock = get_mock_chat();

    // No send expectation: a send to a missing channel would fail the test.
    mock.expect_fetch_channel().returning(|_| Ok(None));

    let chat = ChatClient::new(Arc::new(mock));
    let notification = render(&event(Polarity::Added), &NotifyStyle::default());

    let err = dispatch(&chat, &notification, LOG_CHANNEL_ID).await.expect_err("missing channel should be reported");

    assert!(matches!(err, DispatchError::ChannelMissing(LOG_CHANNEL_ID)));
}

#[tokio::test]
async fn dispatch_sends_to_the_resolved_channel() {
    let mut mock = get_mock_chat();

    mock.expect_fetch_channel().withf(|channel_id| *channel_id == LOG_CHANNEL_ID).returning(|channel_id| {
        Ok(Some(ChannelMeta {
            id: channel_id,
            name: Some("reaction-log".to_string()),
        }))
    });
    mock.expect_send_notification().withf(|channel_id, _| *channel_id == LOG_CHANNEL_ID).times(1).returning(|_, _| Ok(()));

    let chat = ChatClient::new(Arc::new(mock));
    let notification = render(&event(Polarity::Added), &NotifyStyle::default());

    dispatch(&chat, &notification, LOG_CHANNEL_ID).await.expect("dispatch should succeed");
}

#[tokio::test]
async fn dispatch_wraps_send_failures() {
    let mut mock = get_mock_chat();

    mock.expect_fetch_channel().returning(|channel_id| Ok(Some(ChannelMeta { id: channel_id, name: None })));
    mock.expect_send_notification().returning(|_, _| Err(anyhow::anyhow!("missing permissions")));

    let chat = ChatClient::new(Arc::new(mock));
    let notification = render(&event(Polarity::Added), &NotifyStyle::default());

    let err = dispatch(&chat, &notification, LOG_CHANNEL_ID).await.expect_err("send failure should be reported");

    assert!(matches!(err, DispatchError::Delivery { channel_id: LOG_CHANNEL_ID, .. }));
}

// Full pipeline.

#[tokio::test]
async fn bot_reactions_never_dispatch() {
    let mut mock = get_mock_chat();

    // Count deliveries through the pipeline's spawned task; the count must
    // stay at zero for a bot actor.
    let sends = Arc::new(AtomicUsize::new(0));
    let send_count = sends.clone();
    mock.expect_fetch_channel().returning(|channel_id| Ok(Some(ChannelMeta { id: channel_id, name: None })));
    mock.expect_send_notification().returning(move |_, _| {
        send_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let chat = ChatClient::new(Arc::new(mock));

    let actor = UserRef {
        id: 7,
        bot: true,
        avatar_url: None,
    };

    handle_reaction_event(hydrated_raw(), actor, Polarity::Added, test_config(), chat);

    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    assert_eq!(sends.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn delivery_failure_does_not_stall_later_events() {
    let mut mock = get_mock_chat();

    mock.expect_fetch_channel().returning(|channel_id| Ok(Some(ChannelMeta { id: channel_id, name: None })));

    // First delivery fails; both events must still attempt their send.
    let sends = Arc::new(AtomicUsize::new(0));
    let send_count = sends.clone();
    mock.expect_send_notification().returning(move |_, _| {
        if send_count.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(anyhow::anyhow!("rate limited"))
        } else {
            Ok(())
        }
    });

    let chat = ChatClient::new(Arc::new(mock));
    let config = test_config();

    handle_reaction_event(hydrated_raw(), member(42), Polarity::Added, config.clone(), chat.clone());
    handle_reaction_event(hydrated_raw(), member(43), Polarity::Removed, config, chat);

    tokio::time::sleep(tokio::time::Duration::from_millis(300)).await;

    assert_eq!(sends.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn hydration_failure_renders_and_sends_nothing() {
    let mut mock = get_mock_chat();

    mock.expect_fetch_message().returning(|_, _| Err(anyhow::anyhow!("deleted message")));

    // The failed hydration must short-circuit before any delivery.
    let sends = Arc::new(AtomicUsize::new(0));
    let send_count = sends.clone();
    mock.expect_fetch_channel().returning(|channel_id| Ok(Some(ChannelMeta { id: channel_id, name: None })));
    mock.expect_send_notification().returning(move |_, _| {
        send_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let chat = ChatClient::new(Arc::new(mock));

    let raw = RawReaction {
        emoji: fire(),
        message: LazyMessage::Ref {
            message_id: 99,
            channel_id: 2,
            guild_id: Some(1),
        },
    };

    handle_reaction_event(raw, member(42), Polarity::Added, test_config(), chat);

    tokio::time::sleep(tokio::time::Duration::from_millis(200)).await;

    assert_eq!(sends.load(Ordering::SeqCst), 0);
}
