//! Telegram module.
//!
//! This module handles:
//! - The collaborator traits the rest of the crate talks to
//! - Result records of the remote calls
//! - The `grammers` backed client
//! - The lazily connected session shared by all requests
//! - Mock client for testing

pub mod client;
pub mod mock;
pub mod peer;
pub mod session;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TelegramError;

pub use client::{TelegramClient, TelegramConnector};
pub use mock::{MockConfig, MockTelegram};
pub use peer::PeerRef;
pub use session::SessionManager;
pub use types::{
    ChatInfo, MessageReactions, MessageViews, ReactionCount, ReactionList, ReactionTally,
    ReactionUpdate, ReactionsResponse, ViewCount, ViewsResponse,
};

/// Remote methods the service invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr, strum::Display)]
pub enum RemoteMethod {
    /// View counters of messages.
    #[strum(serialize = "messages.getMessagesViews")]
    GetMessagesViews,
    /// Reaction counters of messages.
    #[strum(serialize = "messages.getMessagesReactions")]
    GetMessagesReactions,
    /// Username to peer resolution.
    #[strum(serialize = "contacts.resolveUsername")]
    ResolveUsername,
}

impl RemoteMethod {
    /// Wire name of the method.
    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// Remote calls issued against a connected session.
#[async_trait]
pub trait MessageApi: Send + Sync {
    /// `messages.getMessagesViews` for a single message.
    ///
    /// `increment` asks Telegram to count this call as a view.
    async fn get_messages_views(
        &self,
        peer: &str,
        id: i32,
        increment: bool,
    ) -> Result<ViewsResponse, TelegramError>;

    /// `messages.getMessagesReactions` for a single message.
    async fn get_messages_reactions(
        &self,
        peer: &str,
        id: i32,
    ) -> Result<ReactionsResponse, TelegramError>;
}

/// Produces connected sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect and return a handle ready for remote calls.
    async fn connect(&self) -> Result<Arc<dyn MessageApi>, TelegramError>;
}
