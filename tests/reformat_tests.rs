use chatmd::markdown::{Reformatter, SEARCH_STATUS_MARKER, VIDEO_SUCCESS_MARKER};

/// Tests for the display-fragment conventions of the stream reformatter.
/// These verify that the spacing rules renderers depend on stay stable.

fn feed(reformatter: &mut Reformatter, lines: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    for line in lines {
        out.extend(reformatter.push_line(line));
    }
    out
}

#[test]
fn test_text_lines_end_with_markdown_line_breaks() {
    let mut reformatter = Reformatter::new();
    let fragments = feed(
        &mut reformatter,
        &["plain text", "- a list item", "1. numbered", "more text"],
    );

    for fragment in &fragments {
        assert!(
            fragment.ends_with("  \n") || fragment.ends_with("  \n\n"),
            "every fragment ends with two trailing spaces and one or two newlines, got {fragment:?}"
        );
    }
    assert_eq!(fragments[0], "plain text  \n");
    assert_eq!(
        fragments[1], "- a list item  \n\n",
        "list items get the extra blank line"
    );
    assert_eq!(fragments[2], "1. numbered  \n\n");
    assert_eq!(fragments[3], "more text  \n");
}

#[test]
fn test_code_fence_toggles_pair_up() {
    let mut reformatter = Reformatter::new();

    // Two toggles bring the state back: the line after the closing fence is
    // classified again (the list separator reappears).
    let fragments = feed(&mut reformatter, &["- before", "```", "- inside", "```", "- after"]);
    assert_eq!(fragments[0], "- before  \n\n");
    assert_eq!(fragments[2], "- inside  \n", "code lines are not list items");
    assert_eq!(
        fragments.last().unwrap(),
        "- after  \n\n",
        "after the closing fence, list classification is active again"
    );
}

#[test]
fn test_table_end_emits_blank_line_with_extra_break() {
    let mut reformatter = Reformatter::new();
    let mut fragments = feed(&mut reformatter, &["| a | b |", "| 1 | 2 |"]);
    assert_eq!(fragments, vec!["| a | b |  \n", "| 1 | 2 |  \n"]);

    fragments = reformatter.push_line("text");
    assert_eq!(
        fragments,
        vec!["  \n\n", "text  \n"],
        "leaving a table inserts the separator before the line"
    );
}

#[test]
fn test_table_continuation_via_lookback() {
    let mut reformatter = Reformatter::new();
    feed(&mut reformatter, &["| a | b |"]);

    // A ragged row (no trailing pipe) continues the table because the
    // previous line contained a pipe; no separator yet.
    let fragments = reformatter.push_line("| c ");
    assert_eq!(fragments, vec!["| c   \n"]);

    let fragments = reformatter.push_line("done");
    assert_eq!(fragments[0], "  \n\n");
}

#[test]
fn test_citation_block_end_emits_separator() {
    let mut reformatter = Reformatter::new();
    let fragments = feed(&mut reformatter, &["> quote1", "next"]);
    assert_eq!(
        fragments,
        vec!["> quote1  \n", "  \n", "next  \n"],
        "a blank-line separator is emitted before the first non-quote line"
    );
}

#[test]
fn test_citation_run_has_no_internal_separators() {
    let mut reformatter = Reformatter::new();
    let fragments = feed(&mut reformatter, &["> one", "> two", "> three"]);
    assert_eq!(fragments, vec!["> one  \n", "> two  \n", "> three  \n"]);
}

#[test]
fn test_horizontal_rule_gets_leading_separator() {
    let mut reformatter = Reformatter::new();
    let fragments = feed(&mut reformatter, &["above", "---", "below"]);
    assert_eq!(
        fragments,
        vec!["above  \n", "  \n", "---  \n", "below  \n"]
    );
}

#[test]
fn test_video_success_line_emits_embed_in_order() {
    let mut reformatter = Reformatter::new();
    let line = format!("{VIDEO_SUCCESS_MARKER}//cdn.example.com/out.mp4)");
    let fragments = reformatter.push_line(&line);

    assert_eq!(fragments.len(), 3, "text, separator, then the embed");
    assert_eq!(fragments[0], format!("{line}  \n"));
    assert_eq!(fragments[1], "  \n\n");
    assert!(
        fragments[2].contains("<video") && fragments[2].contains("https://cdn.example.com/out.mp4"),
        "the embed references the exact URL from the line"
    );
    assert!(fragments[2].ends_with("  \n\n"));
}

#[test]
fn test_inline_code_does_not_fake_structure() {
    let mut reformatter = Reformatter::new();
    let fragments = feed(&mut reformatter, &["use `a | b` to pipe", "next line"]);
    assert_eq!(
        fragments,
        vec!["use `a | b` to pipe  \n", "next line  \n"],
        "a pipe inside inline code must not start a table"
    );
}

#[test]
fn test_search_status_suppressed_after_first_occurrence() {
    let mut reformatter = Reformatter::new();
    let searching = format!("{SEARCH_STATUS_MARKER}...");
    let mut fragments = feed(&mut reformatter, &[&searching, &searching, &searching]);
    fragments.extend(reformatter.push_line("result"));
    assert_eq!(fragments, vec![format!("{searching}  \n"), "result  \n".to_string()]);
}
