//! Conversation assembly: chronological merge and thread reconstruction.
//!
//! This is the analytical core of the pipeline and is deliberately pure: it
//! operates on in-memory comment sequences already fetched by the gateway
//! layer, performs no I/O, and holds no shared state, so independent pull
//! requests can be assembled concurrently without coordination.
//!
//! The input contract (inherited from the API, not verified here) is that
//! each comment stream arrives sorted ascending by its ISO-8601 timestamp
//! string. Every fetched comment appears in exactly one output unit: issue
//! comments as standalone units, review comments inside exactly one thread.

mod merge;
mod threading;

use thiserror::Error;

use crate::github::Comment;

pub use merge::merge_chronological;
pub(crate) use merge::merge_by_timestamp;
pub use threading::build_threads;

/// Errors raised while reconstructing reply threads.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssemblyError {
    /// The reply graph contains a cycle, so some comments are unreachable
    /// from every top-level root.
    #[error("malformed reply thread: comment {comment_id} is unreachable from any top-level root")]
    MalformedThread {
        /// One comment id trapped in the cycle.
        comment_id: u64,
    },
}

/// A top-level review comment with its flattened reply subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentThread {
    /// The thread's root comment.
    pub root: Comment,
    /// Diff context the root comment is anchored to.
    pub diff_hunk: Option<String>,
    /// Replies in pre-order depth-first order, siblings sorted ascending by
    /// timestamp.
    pub replies: Vec<Comment>,
}

impl CommentThread {
    /// Timestamp used to position this thread in the overall sequence.
    #[must_use]
    pub const fn anchor_timestamp(&self) -> &str {
        self.root.timestamp.as_str()
    }
}

/// One assembled element of a pull request's conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationUnit {
    /// A standalone issue comment; the issue-comments API has no reply
    /// relationships, so these are never threaded.
    Single(Comment),
    /// A review thread rooted at a top-level review comment.
    Thread(CommentThread),
}

impl ConversationUnit {
    /// Timestamp used to position this unit in the overall sequence: the
    /// comment's own timestamp for a single, the root's for a thread.
    #[must_use]
    pub const fn anchor_timestamp(&self) -> &str {
        match self {
            Self::Single(comment) => comment.timestamp.as_str(),
            Self::Thread(thread) => thread.anchor_timestamp(),
        }
    }

    /// Number of raw comments carried by this unit.
    #[must_use]
    pub fn comment_count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Thread(thread) => 1 + thread.replies.len(),
        }
    }
}

/// Assembles one pull request's conversation from its two comment streams.
///
/// Review comments are reconstructed into threads, issue comments become
/// standalone units, and both are merged into a single ascending sequence by
/// anchor timestamp. On equal anchors the thread is emitted first, matching
/// the raw-comment merge tie-break.
///
/// # Errors
///
/// Returns [`AssemblyError::MalformedThread`] when the review comments
/// contain a reply cycle.
pub fn assemble(
    issue_comments: Vec<Comment>,
    review_comments: Vec<Comment>,
) -> Result<Vec<ConversationUnit>, AssemblyError> {
    let threads: Vec<ConversationUnit> = build_threads(review_comments)?
        .into_iter()
        .map(ConversationUnit::Thread)
        .collect();
    let singles: Vec<ConversationUnit> = issue_comments
        .into_iter()
        .map(ConversationUnit::Single)
        .collect();

    Ok(merge_by_timestamp(threads, singles, |unit| {
        unit.anchor_timestamp()
    }))
}

#[cfg(test)]
mod tests {
    use super::{ConversationUnit, assemble};
    use crate::github::{Comment, CommentKind};

    fn issue(id: u64, timestamp: &str, body: &str) -> Comment {
        Comment {
            id,
            kind: CommentKind::Issue,
            timestamp: timestamp.to_owned(),
            body: body.to_owned(),
            is_from_author: false,
            in_reply_to_id: None,
            diff_hunk: None,
        }
    }

    fn review(id: u64, timestamp: &str, body: &str, in_reply_to_id: Option<u64>) -> Comment {
        Comment {
            id,
            kind: CommentKind::Review,
            timestamp: timestamp.to_owned(),
            body: body.to_owned(),
            is_from_author: false,
            in_reply_to_id,
            diff_hunk: Some("@@ -1 +1 @@".to_owned()),
        }
    }

    #[test]
    fn single_precedes_thread_with_later_anchor() {
        let issue_comments = vec![issue(100, "2023-01-01T00:00:00Z", "a")];
        let review_comments = vec![
            review(1, "2023-01-01T00:00:05Z", "b", None),
            review(2, "2023-01-01T00:00:10Z", "c", Some(1)),
        ];

        let units = assemble(issue_comments, review_comments).expect("should assemble");

        assert_eq!(units.len(), 2);
        let Some(ConversationUnit::Single(first)) = units.first() else {
            panic!("expected a single comment first");
        };
        assert_eq!(first.body, "a");
        let Some(ConversationUnit::Thread(second)) = units.last() else {
            panic!("expected a thread second");
        };
        assert_eq!(second.root.body, "b");
        let reply_bodies: Vec<&str> = second
            .replies
            .iter()
            .map(|reply| reply.body.as_str())
            .collect();
        assert_eq!(reply_bodies, vec!["c"]);
    }

    #[test]
    fn equal_anchor_timestamps_emit_thread_first() {
        let issue_comments = vec![issue(100, "2023-01-01T00:00:00Z", "a")];
        let review_comments = vec![review(1, "2023-01-01T00:00:00Z", "b", None)];

        let units = assemble(issue_comments, review_comments).expect("should assemble");

        assert!(
            matches!(units.first(), Some(ConversationUnit::Thread(_))),
            "thread should win the tie-break"
        );
    }

    #[test]
    fn replies_are_absorbed_into_their_thread() {
        let review_comments = vec![
            review(1, "2023-01-01T00:00:00Z", "root", None),
            review(2, "2023-01-01T00:00:05Z", "r1", Some(1)),
            review(3, "2023-01-01T00:00:10Z", "r2", Some(1)),
        ];

        let units = assemble(Vec::new(), review_comments).expect("should assemble");

        assert_eq!(units.len(), 1, "replies must not surface as units");
        assert_eq!(
            units.iter().map(ConversationUnit::comment_count).sum::<usize>(),
            3,
            "every raw comment appears exactly once"
        );
    }

    #[test]
    fn empty_inputs_assemble_to_empty_sequence() {
        let units = assemble(Vec::new(), Vec::new()).expect("empty input is valid");
        assert!(units.is_empty());
    }
}
