// ── Topic naming and topic sets ──

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::identity::CommunityId;

/// Fixed prefix mapping a community to its push topic.
pub const TOPIC_PREFIX: &str = "community_";

/// A push topic name, e.g. `community_abc123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// The topic a community's members subscribe to.
    pub fn for_community(community: &CommunityId) -> Self {
        Self(format!("{TOPIC_PREFIX}{community}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deduplicated, order-insensitive set of topics.
///
/// Iteration is sorted so registry calls come out in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicSet(BTreeSet<Topic>);

impl TopicSet {
    /// Derive the topic set from community memberships.
    ///
    /// Blank community ids are ignored: they would map to the bare prefix,
    /// which names no community.
    pub fn from_communities<'a>(communities: impl IntoIterator<Item = &'a CommunityId>) -> Self {
        communities
            .into_iter()
            .filter(|c| !c.as_str().trim().is_empty())
            .map(Topic::for_community)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.0.iter().any(|t| t.as_str() == topic)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Topic> {
        self.0.iter()
    }

    /// Topic names as owned strings, in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|t| t.0.clone()).collect()
    }
}

impl FromIterator<Topic> for TopicSet {
    fn from_iter<I: IntoIterator<Item = Topic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TopicSet {
    type Item = &'a Topic;
    type IntoIter = std::collections::btree_set::Iter<'a, Topic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for TopicSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Topic::as_str).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}
