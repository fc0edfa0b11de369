//! Parsing of the `peer` query parameter and caching of resolved peers.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::error::TelegramError;

/// Maximum number of usernames kept by [`PeerCache`].
pub const PEER_CACHE_CAPACITY: usize = 1024;

/// A peer reference the client knows how to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerRef {
    /// The logged-in account itself.
    Myself,
    /// A public username, without the leading `@`.
    Username(String),
}

impl PeerRef {
    /// Parse `me`, `self`, `@name`, `name` and `t.me/name` links.
    pub fn parse(raw: &str) -> Result<Self, TelegramError> {
        let trimmed = raw.trim();

        if trimmed.eq_ignore_ascii_case("me") || trimmed.eq_ignore_ascii_case("self") {
            return Ok(Self::Myself);
        }

        let without_scheme = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .unwrap_or(trimmed);

        let name = without_scheme
            .strip_prefix("t.me/")
            .or_else(|| without_scheme.strip_prefix("telegram.me/"))
            .map(|path| path.split('/').next().unwrap_or_default())
            .unwrap_or(without_scheme);

        let name = name.strip_prefix('@').unwrap_or(name);

        if is_username(name) {
            Ok(Self::Username(name.to_string()))
        } else {
            Err(TelegramError::PeerNotFound(raw.to_string()))
        }
    }
}

// Usernames start with a letter and contain letters, digits and underscores.
fn is_username(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Resolved peers keyed by username.
///
/// Callers asking for the same username while it is being resolved share
/// one resolution. Failures are not cached. Once `capacity` usernames are
/// held, the next new username clears the cache.
pub struct PeerCache<T> {
    entries: DashMap<String, Arc<OnceCell<T>>>,
    capacity: usize,
}

impl<T: Clone> PeerCache<T> {
    /// Create an empty cache holding at most `capacity` usernames.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Return the cached peer for `key`, resolving it with `resolve` if absent.
    pub async fn get_or_resolve<F, Fut>(&self, key: &str, resolve: F) -> Result<T, TelegramError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, TelegramError>>,
    {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(key) {
            self.entries.clear();
        }

        // Clone the cell out so no shard lock is held across the await
        let cell = Arc::clone(&*self.entries.entry(key.to_string()).or_default());

        let result = cell.get_or_try_init(resolve).await.cloned();

        if result.is_err() {
            self.entries
                .remove_if(key, |_, cached| Arc::ptr_eq(cached, &cell) && !cell.initialized());
        }

        result
    }

    /// Number of usernames currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no usernames.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
