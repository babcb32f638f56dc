// ── Domain model ──

pub mod identity;
pub mod outcome;
pub mod token;
pub mod topic;

pub use identity::{CommunityId, Subscriber, SubscriberId};
pub use outcome::{ReconcileOutcome, RegistryAction, SkipReason};
pub use token::{DeviceToken, Permission, TokenGrant};
pub use topic::{TOPIC_PREFIX, Topic, TopicSet};
