//! Library root for `reaction-bot`.
//!
//! Reaction-bot is a notification relay for Discord servers designed to:
//! - Watch reaction-added and reaction-removed events in guild channels
//! - Filter out bot-originated events and hydrate partial references
//! - Render each event into an embed notification
//! - Deliver the notification to a designated log channel
//!
//! Each event is processed by its own task with isolated failure handling,
//! so one failed delivery never affects another event. The architecture is
//! built around an extensible chat trait that allows for different
//! implementations of the platform client.

#[deny(missing_docs)]
pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the reaction-bot runtime:
/// - Creates the runtime context with the Discord client
/// - Starts the gateway listener for reaction events
pub async fn start(config: Config) -> Void {
    info!("Starting reaction-bot ...");

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
