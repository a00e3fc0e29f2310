use std::collections::HashMap;

use reddit_client::RedditClient;
use subweave_core::{UserKarma, DELETED_AUTHOR};
use tracing::warn;

/// Per-run cache of author karma.
///
/// One `/user/{name}/about` request per distinct author. Failed lookups
/// are cached as empty karma so a missing account is only asked about
/// once.
#[derive(Debug, Default)]
pub struct KarmaCache {
    entries: HashMap<String, UserKarma>,
    hits: u64,
    misses: u64,
}

impl KarmaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Karma for `author`, fetched through `client` on a cache miss.
    ///
    /// Deleted authors resolve to empty karma without a request.
    pub async fn lookup(&mut self, client: &RedditClient, author: &str) -> UserKarma {
        if author == DELETED_AUTHOR {
            return UserKarma::default();
        }
        if let Some(karma) = self.entries.get(author) {
            self.hits += 1;
            return *karma;
        }

        self.misses += 1;
        let karma = match client.get_user_about(author).await {
            Ok(user) => UserKarma {
                link_karma: user.link_karma,
                comment_karma: user.comment_karma,
            },
            Err(error) => {
                warn!("Karma lookup for u/{} failed: {}", author, error);
                UserKarma::default()
            }
        };
        self.entries.insert(author.to_string(), karma);
        karma
    }

    /// Seeds an entry without a request.
    pub fn insert(&mut self, author: &str, karma: UserKarma) {
        self.entries.insert(author.to_string(), karma);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
