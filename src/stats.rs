//! Message stats: request validation, the two remote calls and response
//! assembly.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::error::TelegramError;
use crate::metrics;
use crate::telegram::{MessageApi, MessageReactions, MessageViews, RemoteMethod};

/// Raw query parameters of `/api/message`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// Peer of the message (username, `@username`, t.me link or `me`).
    #[param(required = true)]
    pub peer: Option<String>,
    /// ID of the message.
    #[param(required = true)]
    pub id: Option<String>,
}

/// Validated stats request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsRequest {
    /// Target conversation.
    pub peer: String,
    /// Message id within the conversation.
    pub id: i32,
}

/// Why a stats query was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidQuery {
    /// The query string could not be parsed.
    #[error("malformed query: {0}")]
    Malformed(String),
    /// `peer` absent or blank.
    #[error("missing peer")]
    MissingPeer,
    /// `id` absent or blank.
    #[error("missing id")]
    MissingId,
    /// `id` is not a 32-bit integer.
    #[error("id is not an integer: {0}")]
    MalformedId(String),
}

impl TryFrom<StatsQuery> for StatsRequest {
    type Error = InvalidQuery;

    fn try_from(query: StatsQuery) -> Result<Self, Self::Error> {
        let peer = non_blank(query.peer).ok_or(InvalidQuery::MissingPeer)?;
        let id = non_blank(query.id).ok_or(InvalidQuery::MissingId)?;

        let id = id
            .parse::<i32>()
            .map_err(|_| InvalidQuery::MalformedId(id.clone()))?;

        Ok(Self { peer, id })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// View and reaction counts of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Number of views.
    pub views: u64,
    /// Title of the chat the message belongs to.
    pub title: Option<String>,
    /// Sum of all reaction counts.
    pub total_reactions: u64,
    /// Reaction counters in the order Telegram reported them.
    pub reactions: Vec<ReactionStat>,
}

/// Count of one reaction kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReactionStat {
    /// Number of reactions.
    pub count: u64,
    /// Reaction tag.
    pub reaction: String,
}

impl StatsResponse {
    /// Merge the normalized results of the two remote calls.
    pub fn assemble(views: MessageViews, reactions: MessageReactions) -> Self {
        let total_reactions = reactions.total();

        Self {
            views: views.views,
            title: views.title,
            total_reactions,
            reactions: reactions
                .results
                .into_iter()
                .map(|r| ReactionStat {
                    count: r.count,
                    reaction: r.reaction,
                })
                .collect(),
        }
    }
}

/// Fetch views and reactions of a message concurrently.
///
/// Views are always requested with `increment = false`, so this call never
/// changes the counters it reports.
#[instrument(skip(api, request), fields(peer = %request.peer, id = request.id))]
pub async fn fetch_message_stats(
    api: &dyn MessageApi,
    request: &StatsRequest,
) -> Result<StatsResponse, TelegramError> {
    let views = async {
        let start = Instant::now();
        let result = api
            .get_messages_views(&request.peer, request.id, false)
            .await;
        metrics::record_remote_call_latency(start, RemoteMethod::GetMessagesViews);
        result
    };

    let reactions = async {
        let start = Instant::now();
        let result = api.get_messages_reactions(&request.peer, request.id).await;
        metrics::record_remote_call_latency(start, RemoteMethod::GetMessagesReactions);
        result
    };

    let (views, reactions) = tokio::try_join!(views, reactions)?;

    let response = StatsResponse::assemble(views.into(), reactions.into());
    debug!(
        views = response.views,
        total_reactions = response.total_reactions,
        "Assembled message stats"
    );

    Ok(response)
}
