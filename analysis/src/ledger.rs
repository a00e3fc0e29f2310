use std::collections::{BTreeSet, HashMap};
use subweave_core::DELETED_AUTHOR;

/// One directed reply from a user to another user in a community
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub target_user: String,
    pub community: String,
    pub timestamp: i64,
}

/// A crosspost observed during collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrosspostRef {
    pub post_id: String,
    pub community: String,
    pub parent: Option<String>,
}

/// Accumulates user activity across communities during a collection run
///
/// Lookups key on author names exactly as Reddit reports them. Activity
/// by deleted accounts is never registered.
#[derive(Debug, Default)]
pub struct ActivityLedger {
    communities: Vec<String>,
    communities_by_user: HashMap<String, BTreeSet<String>>,
    interactions_by_user: HashMap<String, Vec<Interaction>>,
    crossposts: Vec<CrosspostRef>,
}

impl ActivityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a community to the analyzed set, keeping first-seen order
    ///
    /// Stats rows are later emitted in this order, so it should match the
    /// order communities were collected in.
    pub fn register_community(&mut self, community: &str) {
        if !self.communities.iter().any(|c| c == community) {
            self.communities.push(community.to_string());
        }
    }

    /// Record that a user posted or commented in a community
    pub fn register_activity(&mut self, user: &str, community: &str) {
        if user == DELETED_AUTHOR {
            return;
        }
        self.communities_by_user
            .entry(user.to_string())
            .or_default()
            .insert(community.to_string());
    }

    /// Record a reply from `user` to `target_user`
    ///
    /// Self-replies and replies involving deleted accounts are dropped.
    pub fn register_interaction(
        &mut self,
        user: &str,
        target_user: &str,
        community: &str,
        timestamp: i64,
    ) {
        if user == DELETED_AUTHOR || target_user == DELETED_AUTHOR || user == target_user {
            return;
        }
        self.interactions_by_user
            .entry(user.to_string())
            .or_default()
            .push(Interaction {
                target_user: target_user.to_string(),
                community: community.to_string(),
                timestamp,
            });
    }

    pub fn register_crosspost(&mut self, post_id: &str, community: &str, parent: Option<String>) {
        self.crossposts.push(CrosspostRef {
            post_id: post_id.to_string(),
            community: community.to_string(),
            parent,
        });
    }

    /// Communities in registration order
    pub fn communities(&self) -> &[String] {
        &self.communities
    }

    pub fn communities_of(&self, user: &str) -> Option<&BTreeSet<String>> {
        self.communities_by_user.get(user)
    }

    /// All users with their community sets, in no particular order
    pub fn users(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.communities_by_user.iter()
    }

    pub fn interactions_for(&self, user: &str) -> &[Interaction] {
        self.interactions_by_user
            .get(user)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn crossposts(&self) -> &[CrosspostRef] {
        &self.crossposts
    }

    pub fn total_unique_users(&self) -> usize {
        self.communities_by_user.len()
    }

    /// Users active in at least two communities, sorted by name
    pub fn multi_community_users(&self) -> Vec<(&String, &BTreeSet<String>)> {
        let mut users: Vec<_> = self
            .communities_by_user
            .iter()
            .filter(|(_, communities)| communities.len() >= 2)
            .collect();
        users.sort_by(|a, b| a.0.cmp(b.0));
        users
    }
}
