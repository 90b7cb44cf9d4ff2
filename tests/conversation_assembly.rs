//! Behavioural tests for conversation assembly through the public API.

use magpie::assembly::merge_chronological;
use magpie::transcript::render_transcript;
use magpie::{Comment, CommentKind, ConversationUnit, assemble};

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
        diff_hunk: Some("@@ -38,6 +38,8 @@".to_owned()),
    }
}

#[test]
fn merged_stream_is_an_ascending_permutation_of_both_inputs() {
    let review_comments = vec![
        review(1, "2023-01-01T00:00:02Z", "r1", None),
        review(2, "2023-01-01T00:00:06Z", "r2", None),
        review(3, "2023-01-01T00:00:09Z", "r3", None),
    ];
    let issue_comments = vec![
        issue(10, "2023-01-01T00:00:01Z", "i1"),
        issue(11, "2023-01-01T00:00:06Z", "i2"),
        issue(12, "2023-01-01T00:00:20Z", "i3"),
    ];
    let total = review_comments.len() + issue_comments.len();

    let merged = merge_chronological(review_comments, issue_comments);

    assert_eq!(merged.len(), total);
    assert!(
        merged
            .windows(2)
            .all(|pair| pair.first().map(|a| a.timestamp.as_str())
                <= pair.last().map(|b| b.timestamp.as_str()))
    );
    let mut ids: Vec<u64> = merged.iter().map(|comment| comment.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3, 10, 11, 12]);
    // Stability under the tie-break: at 00:00:06 the review comment leads.
    let tied: Vec<u64> = merged
        .iter()
        .filter(|comment| comment.timestamp.ends_with("06Z"))
        .map(|comment| comment.id)
        .collect();
    assert_eq!(tied, vec![2, 11]);
}

#[test]
fn every_input_comment_lands_in_exactly_one_unit() {
    let issue_comments = vec![
        issue(100, "2023-01-01T00:00:00Z", "i1"),
        issue(101, "2023-01-01T00:00:30Z", "i2"),
    ];
    let review_comments = vec![
        review(1, "2023-01-01T00:00:05Z", "root-a", None),
        review(2, "2023-01-01T00:00:10Z", "reply-a1", Some(1)),
        review(3, "2023-01-01T00:00:15Z", "root-b", None),
        review(4, "2023-01-01T00:00:20Z", "reply-a2", Some(1)),
    ];

    let units = assemble(issue_comments, review_comments).expect("assembly should succeed");

    let carried: usize = units.iter().map(ConversationUnit::comment_count).sum();
    assert_eq!(carried, 6, "no comment may be dropped or duplicated");
    let top_level = units.len();
    assert_eq!(top_level, 4, "replies are absorbed, not emitted as units");
}

#[test]
fn single_then_thread_scenario_orders_by_anchor_timestamp() {
    let issue_comments = vec![issue(100, "2023-01-01T00:00:00Z", "a")];
    let review_comments = vec![
        review(1, "2023-01-01T00:00:05Z", "b", None),
        review(2, "2023-01-01T00:00:10Z", "c", Some(1)),
    ];

    let units = assemble(issue_comments, review_comments).expect("assembly should succeed");

    assert_eq!(units.len(), 2);
    let Some(ConversationUnit::Single(first)) = units.first() else {
        panic!("expected the issue comment first");
    };
    assert_eq!(first.body, "a");
    let Some(ConversationUnit::Thread(thread)) = units.last() else {
        panic!("expected the thread second");
    };
    assert_eq!(thread.root.body, "b");
    assert_eq!(
        thread
            .replies
            .iter()
            .map(|reply| reply.body.as_str())
            .collect::<Vec<_>>(),
        vec!["c"]
    );
}

#[test]
fn transcript_renders_singles_and_threads_in_the_documented_shape() {
    let issue_comments = vec![issue(100, "2023-01-01T00:00:00Z", "Looks good overall.")];
    let review_comments = vec![
        review(1, "2023-01-01T00:00:05Z", "Prefer a tuple here.", None),
        review(2, "2023-01-01T00:00:10Z", "Done, thanks.", Some(1)),
    ];

    let units = assemble(issue_comments, review_comments).expect("assembly should succeed");
    let transcript = render_transcript(&units);

    assert_eq!(
        transcript,
        concat!(
            "(issue comment from reviewer) [2023-01-01T00:00:00Z] Looks good overall.\n",
            "\n",
            "---BEGIN THREAD---\n",
            "Diff Hunk:\n",
            "@@ -38,6 +38,8 @@\n",
            "\n",
            "(from reviewer) [2023-01-01T00:00:05Z] Prefer a tuple here.\n",
            "(from reviewer) [2023-01-01T00:00:10Z] Done, thanks.\n",
            "---END THREAD---"
        )
    );
}

#[test]
fn empty_streams_assemble_and_render_to_nothing() {
    let units = assemble(Vec::new(), Vec::new()).expect("empty input is valid");
    assert!(units.is_empty());
    assert_eq!(render_transcript(&units), "");
}
