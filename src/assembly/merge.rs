//! Chronological merge of already-sorted comment streams.
//!
//! Both GitHub listing endpoints deliver comments in ascending creation
//! order, so a single two-pointer pass produces the combined chronological
//! stream. Timestamps are compared as ISO-8601 strings; lexicographic order
//! equals chronological order for that format.

use crate::github::Comment;

/// Merges two ascending-sorted sequences by a string timestamp key.
///
/// Elements from `preferred` are emitted first on exact timestamp ties. The
/// inputs must each be sorted ascending by the key; this precondition is
/// inherited from the API and is not verified here.
pub(crate) fn merge_by_timestamp<T, K>(preferred: Vec<T>, other: Vec<T>, key: K) -> Vec<T>
where
    K: Fn(&T) -> &str,
{
    let mut merged = Vec::with_capacity(preferred.len() + other.len());
    let mut left = preferred.into_iter().peekable();
    let mut right = other.into_iter().peekable();

    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(a), Some(b)) => key(a) <= key(b),
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        if let Some(item) = next {
            merged.push(item);
        }
    }

    merged
}

/// Merges review and issue comments into one ascending-timestamp sequence.
///
/// Classic merge-sort merge step: O(n+m) comparisons, no allocation beyond
/// the output. On equal timestamps the review comment is emitted first — an
/// explicit, arbitrary tie-break, not a meaningful ordering.
#[must_use]
pub fn merge_chronological(
    review_comments: Vec<Comment>,
    issue_comments: Vec<Comment>,
) -> Vec<Comment> {
    merge_by_timestamp(review_comments, issue_comments, |comment| {
        comment.timestamp.as_str()
    })
}
