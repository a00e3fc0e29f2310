use std::collections::{HashMap, VecDeque};

use reddit_client::{CommentNode, RedditCommentData};
use subweave_core::DELETED_AUTHOR;

/// One comment pulled out of the tree, with its depth and the author it
/// replies to.
#[derive(Debug, Clone)]
pub struct FlattenedComment {
    pub comment: RedditCommentData,
    pub depth: u32,
    pub parent_author: Option<String>,
}

/// Flattens a comment forest breadth-first, keeping at most `limit`
/// comments.
///
/// `more` stubs are dropped unexpanded. Comments by deleted authors are
/// not emitted but still bridge depth and parent attribution for their
/// children.
pub fn flatten_comment_tree(
    nodes: Vec<CommentNode>,
    post_fullname: &str,
    post_author: &str,
    limit: usize,
) -> Vec<FlattenedComment> {
    if limit == 0 {
        return Vec::new();
    }

    // parent_id lookups resolve against every fullname seen so far. In
    // breadth-first order a parent is always visited before its children.
    let mut authors_by_fullname: HashMap<String, String> = HashMap::new();
    authors_by_fullname.insert(post_fullname.to_string(), post_author.to_string());

    let mut queue: VecDeque<(CommentNode, u32)> =
        nodes.into_iter().map(|node| (node, 0)).collect();
    let mut flattened = Vec::new();

    while let Some((node, depth)) = queue.pop_front() {
        let mut comment = match node {
            CommentNode::Comment(comment) => comment,
            CommentNode::More(_) | CommentNode::Unknown => continue,
        };

        authors_by_fullname.insert(comment.fullname(), comment.author.clone());

        if let Some(replies) = comment.replies.take() {
            for child in replies.data.children {
                queue.push_back((child, depth + 1));
            }
        }

        if comment.author == DELETED_AUTHOR {
            continue;
        }

        let parent_author = authors_by_fullname
            .get(&comment.parent_id)
            .filter(|author| author.as_str() != DELETED_AUTHOR)
            .cloned();

        flattened.push(FlattenedComment {
            comment: *comment,
            depth,
            parent_author,
        });
        if flattened.len() >= limit {
            break;
        }
    }

    flattened
}
