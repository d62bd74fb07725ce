//! Subscription model, denylist filter and queue message projection

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A subscription visible to the management credential.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub subscription_id: String,

    pub display_name: String,

    pub state: Option<String>,
}

/// Drops subscriptions whose display name is on the denylist.
///
/// Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionFilter {
    excluded: HashSet<String>,
}

impl SubscriptionFilter {
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_excluded(&self, subscription: &Subscription) -> bool {
        self.excluded.contains(&subscription.display_name)
    }

    /// Keep the retained subscriptions in their original order.
    pub fn apply(&self, subscriptions: Vec<Subscription>) -> Vec<Subscription> {
        subscriptions
            .into_iter()
            .filter(|s| !self.is_excluded(s))
            .collect()
    }
}

/// Plain-text queue payload of the form `"{name},{id}"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueMessage {
    #[serde(rename = "Body")]
    pub body: String,
}

impl From<&Subscription> for QueueMessage {
    fn from(subscription: &Subscription) -> Self {
        Self {
            body: format!(
                "{},{}",
                subscription.display_name, subscription.subscription_id
            ),
        }
    }
}

impl fmt::Display for QueueMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body)
    }
}
