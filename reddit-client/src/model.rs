use serde::{Deserialize, Deserializer};

/// Listing envelope Reddit wraps around paginated results.
#[derive(Debug, Clone, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<T>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub modhash: Option<String>,
    pub dist: Option<u32>,
}

/// Typed thing wrapper for listings whose children share one kind.
#[derive(Debug, Clone, Deserialize)]
pub struct RedditThing<T> {
    pub kind: String,
    pub data: T,
}

/// Submission fields consumed by the collector (thing kind `t3`).
#[derive(Debug, Clone, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    pub author: String,
    // Absent when the author account is deleted.
    pub author_fullname: Option<String>,
    pub subreddit: String,
    pub created_utc: f64,
    pub score: i64,
    pub upvote_ratio: Option<f64>,
    pub num_comments: u64,
    #[serde(default)]
    pub selftext: String,
    pub url: String,
    pub permalink: String,
    #[serde(default)]
    pub is_original_content: bool,
    #[serde(default)]
    pub stickied: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub archived: bool,
    // Fullname of the source submission when this is a crosspost.
    pub crosspost_parent: Option<String>,
    #[serde(default)]
    pub crosspost_parent_list: Vec<serde_json::Value>,
}

/// One node of a comment tree: a comment, an unexpanded `more` stub, or
/// something this client does not consume.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum CommentNode {
    #[serde(rename = "t1")]
    Comment(Box<RedditCommentData>),
    #[serde(rename = "more")]
    More(MoreData),
    #[serde(other)]
    Unknown,
}

/// Stub standing in for comments the listing did not expand.
#[derive(Debug, Clone, Deserialize)]
pub struct MoreData {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub children: Vec<String>,
}

/// Comment fields consumed by the collector (thing kind `t1`).
#[derive(Debug, Clone, Deserialize)]
pub struct RedditCommentData {
    pub id: String,
    pub parent_id: String,
    pub link_id: String,
    pub author: String,
    pub author_fullname: Option<String>,
    pub subreddit: String,
    pub body: String,
    pub score: i64,
    pub created_utc: f64,
    // `false` when never edited, otherwise the edit timestamp.
    #[serde(default, deserialize_with = "deserialize_edited")]
    pub edited: Option<f64>,
    #[serde(default)]
    pub is_submitter: bool,
    pub permalink: String,
    // A nested listing, or the empty string on leaf comments.
    #[serde(default, deserialize_with = "deserialize_replies")]
    pub replies: Option<Box<RedditListing<CommentNode>>>,
}

impl RedditCommentData {
    pub fn fullname(&self) -> String {
        format!("t1_{}", self.id)
    }
}

/// Account fields consumed by the karma lookup (thing kind `t2`).
#[derive(Debug, Clone, Deserialize)]
pub struct RedditUserData {
    pub name: String,
    // Absent on suspended accounts.
    pub link_karma: Option<i64>,
    pub comment_karma: Option<i64>,
    pub created_utc: Option<f64>,
}

/// Subreddit fields consumed by community validation (thing kind `t5`).
#[derive(Debug, Clone, Deserialize)]
pub struct RedditSubredditData {
    pub display_name: String,
    #[serde(default)]
    pub title: String,
    pub subscribers: Option<u64>,
    #[serde(default)]
    pub public_description: String,
    #[serde(default)]
    pub over18: bool,
}

fn deserialize_edited<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Edited {
        Flag(bool),
        Timestamp(f64),
    }

    Ok(match Edited::deserialize(deserializer)? {
        Edited::Flag(_) => None,
        Edited::Timestamp(ts) => Some(ts),
    })
}

fn deserialize_replies<'de, D>(
    deserializer: D,
) -> Result<Option<Box<RedditListing<CommentNode>>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Replies {
        Listing(Box<RedditListing<CommentNode>>),
        Empty(String),
    }

    Ok(match Option::<Replies>::deserialize(deserializer)? {
        Some(Replies::Listing(listing)) => Some(listing),
        _ => None,
    })
}
