use reddit_client::{RedditCommentData, RedditPostData};
use subweave_core::{CommentRecord, PostRecord, UserKarma};

/// Builds a posts dataset row from a submission and its author's karma.
pub fn build_post_record(post: &RedditPostData, karma: UserKarma) -> PostRecord {
    let is_crosspost = !post.crosspost_parent_list.is_empty();

    PostRecord {
        post_id: post.id.clone(),
        title: post.title.clone(),
        author: post.author.clone(),
        author_fullname: post.author_fullname.clone(),
        subreddit: post.subreddit.clone(),
        created_utc: post.created_utc as i64,
        score: post.score,
        upvote_ratio: post.upvote_ratio.unwrap_or_default(),
        num_comments: post.num_comments,
        selftext: post.selftext.clone(),
        url: post.url.clone(),
        permalink: post.permalink.clone(),
        link_karma: karma.link_karma,
        comment_karma: karma.comment_karma,
        is_original_content: post.is_original_content,
        stickied: post.stickied,
        locked: post.locked,
        archived: post.archived,
        crosspost_parent: if is_crosspost {
            post.crosspost_parent.clone()
        } else {
            None
        },
        is_crosspost,
    }
}

/// Builds a comments dataset row.
pub fn build_comment_record(
    comment: &RedditCommentData,
    post_id: &str,
    depth: u32,
    parent_author: Option<&str>,
    karma: UserKarma,
) -> CommentRecord {
    CommentRecord {
        comment_id: comment.id.clone(),
        post_id: post_id.to_string(),
        parent_id: comment.parent_id.clone(),
        author: comment.author.clone(),
        author_fullname: comment.author_fullname.clone(),
        subreddit: comment.subreddit.clone(),
        body: comment.body.clone(),
        score: comment.score,
        created_utc: comment.created_utc as i64,
        edited: comment.edited.map(|ts| ts as i64),
        is_submitter: comment.is_submitter,
        permalink: comment.permalink.clone(),
        depth,
        link_karma: karma.link_karma,
        comment_karma: karma.comment_karma,
        parent_author: parent_author.map(str::to_string),
    }
}
