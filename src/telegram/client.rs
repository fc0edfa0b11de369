//! `grammers` backed Telegram client.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine as _;
use grammers_client::{Client, Config as ClientConfig, InitParams};
use grammers_mtsender::FixedReconnect;
use grammers_session::Session;
use grammers_tl_types as tl;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::TelegramError;

use super::peer::{PeerCache, PeerRef, PEER_CACHE_CAPACITY};
use super::types::{
    ChatInfo, ReactionCount, ReactionList, ReactionUpdate, ReactionsResponse, ViewCount,
    ViewsResponse,
};
use super::{Connector, MessageApi, RemoteMethod};

/// Reconnection attempts after the connection drops.
pub const CONNECTION_RETRIES: usize = 5;

static RECONNECT_POLICY: FixedReconnect = FixedReconnect {
    attempts: CONNECTION_RETRIES,
    delay: Duration::from_secs(1),
};

/// Builds connected clients from the configured credentials.
pub struct TelegramConnector {
    /// Application id.
    api_id: i32,
    /// Application hash.
    api_hash: String,
    /// Base64 encoded serialized session.
    session: String,
}

impl TelegramConnector {
    /// Create a connector from config.
    pub fn new(config: &Config) -> Self {
        Self {
            api_id: config.apiid,
            api_hash: config.apihash.clone(),
            session: config.stringsession.clone(),
        }
    }
}

#[async_trait]
impl Connector for TelegramConnector {
    #[instrument(skip(self), fields(api_id = self.api_id))]
    async fn connect(&self) -> Result<Arc<dyn MessageApi>, TelegramError> {
        let session = decode_session(&self.session)?;

        debug!("Connecting to Telegram");

        let client = Client::connect(ClientConfig {
            session,
            api_id: self.api_id,
            api_hash: self.api_hash.clone(),
            params: InitParams {
                catch_up: false,
                update_queue_limit: Some(100),
                reconnection_policy: &RECONNECT_POLICY,
                ..Default::default()
            },
        })
        .await
        .map_err(|e| TelegramError::Connection(e.to_string()))?;

        let authorized = client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))?;

        if !authorized {
            return Err(TelegramError::Unauthorized);
        }

        info!("Telegram session connected");

        Ok(Arc::new(TelegramClient::new(client)))
    }
}

/// Version prefix of portable string sessions.
const STRING_SESSION_VERSION: char = '1';

/// Length of an MTProto authorization key.
const AUTH_KEY_LEN: usize = 256;

/// Longest address text accepted after a length prefix.
const MAX_ADDRESS_TEXT_LEN: usize = 100;

/// Decode a session string.
///
/// Accepts a portable string session (`1` followed by base64 of the DC id,
/// server address, port and auth key) or a base64 encoded `grammers`
/// session.
pub fn decode_session(encoded: &str) -> Result<Session, TelegramError> {
    let encoded = encoded.trim();

    if let Some(body) = encoded.strip_prefix(STRING_SESSION_VERSION) {
        if let Ok(string_session) = StringSession::decode(body) {
            return Ok(string_session.into_session());
        }
    }

    let bytes = decode_base64(encoded)?;

    Session::load(&bytes).map_err(|e| TelegramError::InvalidSession(e.to_string()))
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>, TelegramError> {
    STANDARD
        .decode(encoded)
        .or_else(|_| URL_SAFE.decode(encoded))
        .map_err(|e| TelegramError::InvalidSession(e.to_string()))
}

/// Contents of a portable string session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringSession {
    /// Data center the account lives in.
    pub dc_id: u8,
    /// Address of that data center.
    pub addr: SocketAddr,
    /// Authorization key bound to the account.
    pub auth_key: [u8; AUTH_KEY_LEN],
}

impl StringSession {
    /// Decode the base64 body that follows the version prefix.
    ///
    /// The address is a raw IPv4 address (4 bytes), a big-endian `u16`
    /// length followed by the address text, or a raw IPv6 address (16 bytes).
    pub fn decode(body: &str) -> Result<Self, TelegramError> {
        let bytes = decode_base64(body)?;
        let invalid = |reason: &str| TelegramError::InvalidSession(reason.to_string());

        let (&dc_id, rest) = bytes.split_first().ok_or_else(|| invalid("empty session"))?;

        if rest.len() < 2 + 2 + AUTH_KEY_LEN {
            return Err(invalid("truncated session"));
        }

        let (ip, rest) = if rest.len() == 4 + 2 + AUTH_KEY_LEN {
            let octets: [u8; 4] = rest[..4].try_into().map_err(|_| invalid("bad IPv4"))?;
            (IpAddr::V4(Ipv4Addr::from(octets)), &rest[4..])
        } else {
            let len = usize::from(u16::from_be_bytes([rest[0], rest[1]]));
            if len > MAX_ADDRESS_TEXT_LEN {
                // No length prefix: a raw IPv6 address
                let octets: [u8; 16] = rest
                    .get(..16)
                    .and_then(|octets| octets.try_into().ok())
                    .ok_or_else(|| invalid("bad IPv6"))?;
                (IpAddr::V6(Ipv6Addr::from(octets)), &rest[16..])
            } else {
                let text = rest
                    .get(2..2 + len)
                    .and_then(|text| std::str::from_utf8(text).ok())
                    .ok_or_else(|| invalid("bad address"))?;
                let ip: IpAddr = text.parse().map_err(|_| invalid("bad address"))?;
                (ip, &rest[2 + len..])
            }
        };

        if rest.len() != 2 + AUTH_KEY_LEN {
            return Err(invalid("bad auth key length"));
        }

        let port = u16::from_be_bytes([rest[0], rest[1]]);
        let auth_key: [u8; AUTH_KEY_LEN] = rest[2..]
            .try_into()
            .map_err(|_| invalid("bad auth key length"))?;

        Ok(Self {
            dc_id,
            addr: SocketAddr::new(ip, port),
            auth_key,
        })
    }

    /// Build a `grammers` session pinned to this data center.
    pub fn into_session(self) -> Session {
        let dc = i32::from(self.dc_id);
        let session = Session::new();

        session.insert_dc(dc, self.addr, self.auth_key);
        // User id is unknown here; only the DC is used to connect.
        session.set_user(0, dc, false);

        session
    }
}

/// Connected Telegram client.
pub struct TelegramClient {
    /// Underlying MTProto client.
    client: Client,
    /// Input peers already resolved, keyed by username.
    peers: PeerCache<tl::enums::InputPeer>,
}

impl TelegramClient {
    /// Wrap a connected client.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            peers: PeerCache::new(PEER_CACHE_CAPACITY),
        }
    }

    /// Resolve a peer string to an input peer, caching usernames.
    #[instrument(skip(self))]
    async fn input_peer(&self, peer: &str) -> Result<tl::enums::InputPeer, TelegramError> {
        let username = match PeerRef::parse(peer)? {
            PeerRef::Myself => return Ok(tl::enums::InputPeer::PeerSelf),
            PeerRef::Username(name) => name.to_lowercase(),
        };

        self.peers
            .get_or_resolve(&username, || async {
                let chat = self
                    .client
                    .resolve_username(&username)
                    .await
                    .map_err(|e| remote_error(RemoteMethod::ResolveUsername, e))?
                    .ok_or_else(|| TelegramError::PeerNotFound(peer.to_string()))?;

                debug!(username = %username, "Resolved peer");

                Ok(chat.pack().to_input_peer())
            })
            .await
    }
}

#[async_trait]
impl MessageApi for TelegramClient {
    #[instrument(skip(self))]
    async fn get_messages_views(
        &self,
        peer: &str,
        id: i32,
        increment: bool,
    ) -> Result<ViewsResponse, TelegramError> {
        let request = tl::functions::messages::GetMessagesViews {
            peer: self.input_peer(peer).await?,
            id: vec![id],
            increment,
        };

        let tl::enums::messages::MessageViews::Views(result) = self
            .client
            .invoke(&request)
            .await
            .map_err(|e| remote_error(RemoteMethod::GetMessagesViews, e))?;

        Ok(views_from_tl(result))
    }

    #[instrument(skip(self))]
    async fn get_messages_reactions(
        &self,
        peer: &str,
        id: i32,
    ) -> Result<ReactionsResponse, TelegramError> {
        let request = tl::functions::messages::GetMessagesReactions {
            peer: self.input_peer(peer).await?,
            id: vec![id],
        };

        let updates = self
            .client
            .invoke(&request)
            .await
            .map_err(|e| remote_error(RemoteMethod::GetMessagesReactions, e))?;

        Ok(reactions_from_tl(updates))
    }
}

fn remote_error(method: RemoteMethod, err: impl std::fmt::Display) -> TelegramError {
    TelegramError::RemoteCall {
        method: method.name(),
        reason: err.to_string(),
    }
}

fn views_from_tl(result: tl::types::messages::MessageViews) -> ViewsResponse {
    let views = result
        .views
        .into_iter()
        .map(|entry| {
            let tl::enums::MessageViews::Views(entry) = entry;
            ViewCount {
                views: entry.views.map(i64::from),
            }
        })
        .collect();

    let chats = result
        .chats
        .iter()
        .map(|chat| ChatInfo {
            title: chat_title(chat),
        })
        .collect();

    ViewsResponse {
        views: Some(views),
        chats: Some(chats),
    }
}

fn chat_title(chat: &tl::enums::Chat) -> Option<String> {
    match chat {
        tl::enums::Chat::Empty(_) => None,
        tl::enums::Chat::Chat(c) => Some(c.title.clone()),
        tl::enums::Chat::Forbidden(c) => Some(c.title.clone()),
        tl::enums::Chat::Channel(c) => Some(c.title.clone()),
        tl::enums::Chat::ChannelForbidden(c) => Some(c.title.clone()),
    }
}

fn reactions_from_tl(updates: tl::enums::Updates) -> ReactionsResponse {
    let updates = match updates {
        tl::enums::Updates::Updates(u) => u.updates,
        tl::enums::Updates::Combined(u) => u.updates,
        tl::enums::Updates::UpdateShort(u) => vec![u.update],
        _ => Vec::new(),
    };

    let updates = updates
        .into_iter()
        .map(|update| ReactionUpdate {
            reactions: match update {
                tl::enums::Update::MessageReactions(u) => Some(reaction_list(u.reactions)),
                _ => None,
            },
        })
        .collect();

    ReactionsResponse {
        updates: Some(updates),
    }
}

fn reaction_list(reactions: tl::enums::MessageReactions) -> ReactionList {
    let tl::enums::MessageReactions::Reactions(reactions) = reactions;

    let results = reactions
        .results
        .into_iter()
        .map(|result| {
            let tl::enums::ReactionCount::Count(result) = result;
            ReactionCount {
                count: i64::from(result.count),
                reaction: reaction_tag(&result.reaction),
            }
        })
        .collect();

    ReactionList {
        results: Some(results),
    }
}

/// String tag of a reaction.
#[allow(unreachable_patterns)]
fn reaction_tag(reaction: &tl::enums::Reaction) -> String {
    match reaction {
        tl::enums::Reaction::Empty => String::new(),
        tl::enums::Reaction::Emoji(r) => r.emoticon.clone(),
        tl::enums::Reaction::CustomEmoji(r) => format!("custom:{}", r.document_id),
        _ => "paid".to_string(),
    }
}
