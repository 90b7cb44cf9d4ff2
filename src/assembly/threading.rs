//! Reply-thread reconstruction for review comments.
//!
//! Review comments arrive as a flat list in which replies point at their
//! parent through `in_reply_to_id`. This module partitions the list into
//! top-level roots and a reply map keyed by parent id, then flattens each
//! root's reply subtree depth-first. An explicit stack replaces recursion so
//! pathological reply depth cannot overflow the call stack.

use std::collections::HashMap;

use crate::github::Comment;

use super::{AssemblyError, CommentThread};

/// Reconstructs reply threads from a flat review-comment list.
///
/// Sibling replies are sorted ascending by timestamp before flattening;
/// transitive replies are spliced in immediately after their parent
/// (pre-order depth-first), not re-sorted across the whole thread. A reply
/// whose parent id is absent from the input is promoted to a top-level root
/// so no comment is ever dropped.
///
/// # Errors
///
/// Returns [`AssemblyError::MalformedThread`] when a reply cycle leaves
/// comments unreachable from every top-level root.
pub fn build_threads(review_comments: Vec<Comment>) -> Result<Vec<CommentThread>, AssemblyError> {
    let known_ids: std::collections::HashSet<u64> =
        review_comments.iter().map(|comment| comment.id).collect();

    let mut roots: Vec<Comment> = Vec::new();
    let mut reply_map: HashMap<u64, Vec<Comment>> = HashMap::new();
    for comment in review_comments {
        match comment.in_reply_to_id {
            // A parent id outside the fetched set marks an orphaned reply;
            // it becomes a root rather than being lost.
            Some(parent) if known_ids.contains(&parent) => {
                reply_map.entry(parent).or_default().push(comment);
            }
            _ => roots.push(comment),
        }
    }

    for bucket in reply_map.values_mut() {
        bucket.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    }

    let threads = roots
        .into_iter()
        .map(|root| flatten_thread(root, &mut reply_map))
        .collect();

    // A reply cycle (or duplicate-id corruption) leaves buckets that no
    // root-driven traversal ever reaches.
    if let Some(stranded) = reply_map
        .values()
        .flat_map(|bucket| bucket.iter().map(|comment| comment.id))
        .min()
    {
        return Err(AssemblyError::MalformedThread {
            comment_id: stranded,
        });
    }

    Ok(threads)
}

/// Flattens one root's reply subtree into pre-order depth-first order.
fn flatten_thread(root: Comment, reply_map: &mut HashMap<u64, Vec<Comment>>) -> CommentThread {
    let mut replies: Vec<Comment> = Vec::new();
    let mut stack: Vec<Comment> = reply_map.remove(&root.id).unwrap_or_default();
    stack.reverse();

    while let Some(reply) = stack.pop() {
        if let Some(children) = reply_map.remove(&reply.id) {
            stack.extend(children.into_iter().rev());
        }
        replies.push(reply);
    }

    let diff_hunk = root.diff_hunk.clone();
    CommentThread {
        root,
        diff_hunk,
        replies,
    }
}
