//! Mock Telegram client for unit testing.
//!
//! This module provides a mock collaborator that can be used in tests
//! without touching the network. It counts every call so tests can assert
//! how many connects and remote calls a request caused.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TelegramError;

use super::types::{
    ChatInfo, ReactionCount, ReactionList, ReactionUpdate, ReactionsResponse, ViewCount,
    ViewsResponse,
};
use super::{Connector, MessageApi, RemoteMethod};

/// Configuration for mock client behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Views result to return.
    pub views: ViewsResponse,
    /// Reactions result to return.
    pub reactions: ReactionsResponse,
    /// Number of connect attempts that fail before one succeeds.
    pub failing_connects: usize,
    /// Whether to fail views requests.
    pub fail_views: bool,
    /// Whether to fail reactions requests.
    pub fail_reactions: bool,
    /// Simulated latency in milliseconds, applied to every call.
    pub latency_ms: u64,
}

#[derive(Debug, Default)]
struct CallCounters {
    connects: AtomicUsize,
    views: AtomicUsize,
    reactions: AtomicUsize,
    incremented: AtomicBool,
}

/// Mock Telegram collaborator, usable both as connector and as session.
#[derive(Debug, Clone, Default)]
pub struct MockTelegram {
    /// Mock configuration.
    config: MockConfig,
    /// Shared call counters.
    calls: Arc<CallCounters>,
}

impl MockTelegram {
    /// Create a new mock with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock with custom configuration.
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            calls: Arc::new(CallCounters::default()),
        }
    }

    /// Set the views result.
    pub fn set_views(&mut self, views: ViewsResponse) {
        self.config.views = views;
    }

    /// Set the reactions result.
    pub fn set_reactions(&mut self, reactions: ReactionsResponse) {
        self.config.reactions = reactions;
    }

    /// Number of connect calls made so far.
    pub fn connect_calls(&self) -> usize {
        self.calls.connects.load(Ordering::SeqCst)
    }

    /// Number of views calls made so far.
    pub fn views_calls(&self) -> usize {
        self.calls.views.load(Ordering::SeqCst)
    }

    /// Number of reactions calls made so far.
    pub fn reactions_calls(&self) -> usize {
        self.calls.reactions.load(Ordering::SeqCst)
    }

    /// Whether any views call asked for the counter to be incremented.
    pub fn increment_requested(&self) -> bool {
        self.calls.incremented.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }
    }
}

#[async_trait]
impl Connector for MockTelegram {
    async fn connect(&self) -> Result<Arc<dyn MessageApi>, TelegramError> {
        let attempt = self.calls.connects.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if attempt < self.config.failing_connects {
            return Err(TelegramError::Connection(
                "Mock connect failure".to_string(),
            ));
        }

        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl MessageApi for MockTelegram {
    async fn get_messages_views(
        &self,
        _peer: &str,
        _id: i32,
        increment: bool,
    ) -> Result<ViewsResponse, TelegramError> {
        self.calls.views.fetch_add(1, Ordering::SeqCst);
        if increment {
            self.calls.incremented.store(true, Ordering::SeqCst);
        }
        self.simulate_latency().await;

        if self.config.fail_views {
            return Err(TelegramError::RemoteCall {
                method: RemoteMethod::GetMessagesViews.name(),
                reason: "Mock views failure".to_string(),
            });
        }

        Ok(self.config.views.clone())
    }

    async fn get_messages_reactions(
        &self,
        _peer: &str,
        _id: i32,
    ) -> Result<ReactionsResponse, TelegramError> {
        self.calls.reactions.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.config.fail_reactions {
            return Err(TelegramError::RemoteCall {
                method: RemoteMethod::GetMessagesReactions.name(),
                reason: "Mock reactions failure".to_string(),
            });
        }

        Ok(self.config.reactions.clone())
    }
}

/// Views result with a single counter and chat title.
pub fn views_response(views: i64, title: Option<&str>) -> ViewsResponse {
    ViewsResponse {
        views: Some(vec![ViewCount { views: Some(views) }]),
        chats: Some(
            title
                .map(|t| {
                    vec![ChatInfo {
                        title: Some(t.to_string()),
                    }]
                })
                .unwrap_or_default(),
        ),
    }
}

/// Reactions result with one update carrying the given counters.
pub fn reactions_response(results: &[(&str, i64)]) -> ReactionsResponse {
    ReactionsResponse {
        updates: Some(vec![ReactionUpdate {
            reactions: Some(ReactionList {
                results: Some(
                    results
                        .iter()
                        .map(|(reaction, count)| ReactionCount::new(*reaction, *count))
                        .collect(),
                ),
            }),
        }]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_returns_configured_results() {
        let mut mock = MockTelegram::new();
        mock.set_views(views_response(10, Some("Group X")));
        mock.set_reactions(reactions_response(&[("👍", 3)]));

        let views = mock.get_messages_views("chat1", 42, false).await.unwrap();
        let reactions = mock.get_messages_reactions("chat1", 42).await.unwrap();

        assert_eq!(views, views_response(10, Some("Group X")));
        assert_eq!(reactions, reactions_response(&[("👍", 3)]));
        assert_eq!(mock.views_calls(), 1);
        assert_eq!(mock.reactions_calls(), 1);
        assert!(!mock.increment_requested());
    }

    #[tokio::test]
    async fn mock_counts_are_shared_with_connected_handle() {
        let mock = MockTelegram::new();

        let handle = mock.connect().await.unwrap();
        handle.get_messages_views("chat1", 1, true).await.unwrap();

        assert_eq!(mock.connect_calls(), 1);
        assert_eq!(mock.views_calls(), 1);
        assert!(mock.increment_requested());
    }

    #[tokio::test]
    async fn mock_client_failure_modes() {
        let config = MockConfig {
            failing_connects: 1,
            fail_reactions: true,
            ..Default::default()
        };
        let mock = MockTelegram::with_config(config);

        assert!(mock.connect().await.is_err());
        assert!(mock.connect().await.is_ok());
        assert!(mock.get_messages_reactions("chat1", 1).await.is_err());
        assert!(mock.get_messages_views("chat1", 1, false).await.is_ok());
    }
}
