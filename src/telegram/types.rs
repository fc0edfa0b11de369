//! Result records of the two remote calls.
//!
//! The raw records mirror what Telegram sends back, with every field
//! optional. [`MessageViews`] and [`MessageReactions`] are the normalized
//! forms; all defaulting of missing data happens in their `From` impls.

use serde::{Deserialize, Serialize};

/// Raw result of `messages.getMessagesViews`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ViewsResponse {
    /// One entry per requested message id.
    pub views: Option<Vec<ViewCount>>,
    /// Chats mentioned in the result.
    pub chats: Option<Vec<ChatInfo>>,
}

/// View counter of a single message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ViewCount {
    /// Number of views, absent when the message does not track views.
    pub views: Option<i64>,
}

/// Chat entry attached to a views result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatInfo {
    /// Chat title, absent for chats without one.
    pub title: Option<String>,
}

/// Raw result of `messages.getMessagesReactions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReactionsResponse {
    /// Updates carried by the result.
    pub updates: Option<Vec<ReactionUpdate>>,
}

/// A single update of a reactions result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReactionUpdate {
    /// Reactions payload, absent for updates of other kinds.
    pub reactions: Option<ReactionList>,
}

/// Reactions attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReactionList {
    /// Per-reaction counters.
    pub results: Option<Vec<ReactionCount>>,
}

/// Counter of one reaction kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReactionCount {
    /// How many users reacted this way.
    pub count: i64,
    /// Reaction tag, usually an emoji.
    pub reaction: String,
}

impl ReactionCount {
    /// Create a counter.
    pub fn new(reaction: impl Into<String>, count: i64) -> Self {
        Self {
            count,
            reaction: reaction.into(),
        }
    }
}

/// Normalized view data of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageViews {
    /// View count, 0 when unknown.
    pub views: u64,
    /// Title of the chat the message belongs to.
    pub title: Option<String>,
}

impl From<ViewsResponse> for MessageViews {
    fn from(response: ViewsResponse) -> Self {
        let views = response
            .views
            .and_then(|views| views.into_iter().next())
            .and_then(|entry| entry.views)
            .map(clamp_count)
            .unwrap_or(0);

        let title = response
            .chats
            .and_then(|chats| chats.into_iter().next())
            .and_then(|chat| chat.title);

        Self { views, title }
    }
}

/// Normalized reaction data of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageReactions {
    /// Reaction counters in the order Telegram reported them.
    pub results: Vec<ReactionTally>,
}

/// A reaction counter after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionTally {
    /// Reaction tag.
    pub reaction: String,
    /// Non-negative count.
    pub count: u64,
}

impl MessageReactions {
    /// Sum of all reaction counts.
    pub fn total(&self) -> u64 {
        self.results.iter().map(|r| r.count).sum()
    }
}

impl From<ReactionsResponse> for MessageReactions {
    fn from(response: ReactionsResponse) -> Self {
        let results = response
            .updates
            .unwrap_or_default()
            .into_iter()
            .find_map(|update| update.reactions.and_then(|list| list.results))
            .unwrap_or_default()
            .into_iter()
            .map(|r| ReactionTally {
                reaction: r.reaction,
                count: clamp_count(r.count),
            })
            .collect();

        Self { results }
    }
}

fn clamp_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn views_default_to_zero_without_views_array() {
        let views = MessageViews::from(ViewsResponse {
            views: None,
            chats: Some(vec![ChatInfo {
                title: Some("Group X".to_string()),
            }]),
        });

        assert_eq!(views.views, 0);
        assert_eq!(views.title.as_deref(), Some("Group X"));
    }

    #[test]
    fn views_take_first_entry() {
        let views = MessageViews::from(ViewsResponse {
            views: Some(vec![
                ViewCount { views: Some(10) },
                ViewCount { views: Some(99) },
            ]),
            chats: None,
        });

        assert_eq!(
            views,
            MessageViews {
                views: 10,
                title: None
            }
        );
    }

    #[test]
    fn views_entry_without_counter_is_zero() {
        let views = MessageViews::from(ViewsResponse {
            views: Some(vec![ViewCount { views: None }]),
            chats: Some(vec![]),
        });

        assert_eq!(views.views, 0);
        assert_eq!(views.title, None);
    }

    #[test]
    fn raw_views_deserialize_from_partial_json() {
        let raw: ViewsResponse =
            serde_json::from_value(serde_json::json!({ "chats": [{ "title": "News" }] })).unwrap();

        let views = MessageViews::from(raw);
        assert_eq!(views.views, 0);
        assert_eq!(views.title.as_deref(), Some("News"));
    }

    #[test]
    fn reactions_empty_without_updates() {
        let reactions = MessageReactions::from(ReactionsResponse { updates: None });
        assert!(reactions.results.is_empty());
        assert_eq!(reactions.total(), 0);

        let reactions = MessageReactions::from(ReactionsResponse {
            updates: Some(vec![]),
        });
        assert!(reactions.results.is_empty());
    }

    #[test]
    fn reactions_skip_updates_without_results() {
        let reactions = MessageReactions::from(ReactionsResponse {
            updates: Some(vec![
                ReactionUpdate { reactions: None },
                ReactionUpdate {
                    reactions: Some(ReactionList {
                        results: Some(vec![
                            ReactionCount::new("👍", 3),
                            ReactionCount::new("❤️", 2),
                        ]),
                    }),
                },
            ]),
        });

        assert_eq!(
            reactions.results,
            vec![
                ReactionTally {
                    reaction: "👍".to_string(),
                    count: 3
                },
                ReactionTally {
                    reaction: "❤️".to_string(),
                    count: 2
                },
            ]
        );
        assert_eq!(reactions.total(), 5);
    }

    #[test]
    fn negative_counts_clamp_to_zero() {
        let reactions = MessageReactions::from(ReactionsResponse {
            updates: Some(vec![ReactionUpdate {
                reactions: Some(ReactionList {
                    results: Some(vec![ReactionCount::new("🔥", -4)]),
                }),
            }]),
        });

        assert_eq!(reactions.total(), 0);
    }
}
