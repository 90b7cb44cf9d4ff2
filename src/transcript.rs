//! Transcript rendering for assembled conversations.
//!
//! The output shape is a compatibility contract consumed by the
//! classification prompts and the dataset's formatted-comments column:
//!
//! ```text
//! (issue comment from reviewer) [2023-04-25T07:58:37Z] Looks good overall.
//!
//! ---BEGIN THREAD---
//! Diff Hunk:
//! @@ -38,6 +38,8 @@
//!
//! (from reviewer) [2023-04-25T08:30:54Z] Prefer a tuple here.
//! (from author) [2023-04-25T20:35:18Z] Done, thanks.
//! ---END THREAD---
//! ```

use crate::assembly::{CommentThread, ConversationUnit};
use crate::github::Comment;

const THREAD_BEGIN: &str = "---BEGIN THREAD---";
const THREAD_END: &str = "---END THREAD---";

/// Renders a full conversation, one unit per block separated by blank lines.
#[must_use]
pub fn render_transcript(units: &[ConversationUnit]) -> String {
    units
        .iter()
        .map(render_unit)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders one conversation unit.
#[must_use]
pub fn render_unit(unit: &ConversationUnit) -> String {
    match unit {
        ConversationUnit::Single(comment) => render_single(comment),
        ConversationUnit::Thread(thread) => render_thread(thread),
    }
}

/// Renders a standalone comment with its endpoint kind spelled out.
fn render_single(comment: &Comment) -> String {
    format!(
        "({kind} comment from {role}) [{timestamp}] {body}",
        kind = comment.kind.label(),
        role = role(comment),
        timestamp = comment.timestamp,
        body = comment.body,
    )
}

/// Renders a thread: diff hunk header, then root and replies in order.
fn render_thread(thread: &CommentThread) -> String {
    let mut lines = Vec::with_capacity(thread.replies.len() + 1);
    lines.push(thread_line(&thread.root));
    lines.extend(thread.replies.iter().map(thread_line));

    format!(
        "{THREAD_BEGIN}\nDiff Hunk:\n{hunk}\n\n{conversation}\n{THREAD_END}",
        hunk = thread.diff_hunk.as_deref().unwrap_or_default(),
        conversation = lines.join("\n"),
    )
}

fn thread_line(comment: &Comment) -> String {
    format!(
        "(from {role}) [{timestamp}] {body}",
        role = role(comment),
        timestamp = comment.timestamp,
        body = comment.body,
    )
}

const fn role(comment: &Comment) -> &'static str {
    if comment.is_from_author {
        "author"
    } else {
        "reviewer"
    }
}
