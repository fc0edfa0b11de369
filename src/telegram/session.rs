//! Lazily connected session shared by all requests.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::error::TelegramError;
use crate::metrics;

use super::{Connector, MessageApi};

/// Owns the single Telegram session of the process.
///
/// The first call to [`SessionManager::ensure_session`] connects; every
/// later call reuses the handle. Callers arriving while the connect is in
/// flight wait for that same attempt instead of starting their own. A failed
/// attempt leaves nothing behind, so the next caller tries again.
pub struct SessionManager {
    connector: Arc<dyn Connector>,
    session: OnceCell<Arc<dyn MessageApi>>,
}

impl SessionManager {
    /// Create a manager that connects through `connector` on first use.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            session: OnceCell::new(),
        }
    }

    /// Return the connected session, connecting first if needed.
    pub async fn ensure_session(&self) -> Result<Arc<dyn MessageApi>, TelegramError> {
        let session = self
            .session
            .get_or_try_init(|| async {
                info!("Initializing Telegram session");
                metrics::inc_session_connects();

                self.connector.connect().await.inspect_err(|e| {
                    metrics::inc_session_connect_failures();
                    warn!(error = %e, "Telegram session initialization failed");
                })
            })
            .await?;

        Ok(Arc::clone(session))
    }

    /// Whether a session has been established.
    pub fn is_connected(&self) -> bool {
        self.session.initialized()
    }
}
