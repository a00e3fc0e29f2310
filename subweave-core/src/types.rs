use serde::{Deserialize, Serialize};

/// Author name Reddit substitutes once an account is deleted.
pub const DELETED_AUTHOR: &str = "[deleted]";

/// One row of the posts dataset. Field order matches the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub post_id: String,
    pub title: String,
    pub author: String,
    pub author_fullname: Option<String>,
    pub subreddit: String,
    pub created_utc: i64,
    pub score: i64,
    pub upvote_ratio: f64,
    pub num_comments: u64,
    pub selftext: String,
    pub url: String,
    pub permalink: String,
    pub link_karma: Option<i64>,
    pub comment_karma: Option<i64>,
    pub is_original_content: bool,
    pub stickied: bool,
    pub locked: bool,
    pub archived: bool,
    pub crosspost_parent: Option<String>,
    pub is_crosspost: bool,
}

/// One row of the comments dataset. Field order matches the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub comment_id: String,
    pub post_id: String,
    pub parent_id: String,
    pub author: String,
    pub author_fullname: Option<String>,
    pub subreddit: String,
    pub body: String,
    pub score: i64,
    pub created_utc: i64,
    pub edited: Option<i64>,
    pub is_submitter: bool,
    pub permalink: String,
    pub depth: u32,
    pub link_karma: Option<i64>,
    pub comment_karma: Option<i64>,
    pub parent_author: Option<String>,
}

/// One community pair shared by a multi-community user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterconnectionRecord {
    pub user: String,
    pub community1: String,
    pub community2: String,
    pub interaction_type: String,
    pub interaction_count: u64,
    pub first_interaction: Option<i64>,
    pub last_interaction: Option<i64>,
}

/// Per-community aggregate of user overlap with the other collected communities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityStatsRecord {
    pub community: String,
    pub total_users: u64,
    pub multi_community_users: u64,
    pub interconnection_ratio: f64,
    pub connected_communities_count: u64,
    pub connected_communities: String,
}

/// Karma snapshot for one author. Both fields stay empty for deleted or
/// unfetchable accounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserKarma {
    pub link_karma: Option<i64>,
    pub comment_karma: Option<i64>,
}
