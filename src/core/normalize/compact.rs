//! Collapse + compact pipeline.

use std::sync::LazyLock;

use regex::Regex;

use super::ordinal_title;

/// A list item (or bare line) whose text opens with a bold run: `- **Average**`.
static BOLD_BULLET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-*]\s+)?\*\*.+?\*\*").expect("bold bullet pattern is valid")
});

/// Markdown soft break: trailing spaces that end a line without a new paragraph.
pub const SOFT_BREAK: &str = "  ";

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_bold_bullet(line: &str) -> bool {
    BOLD_BULLET.is_match(line.trim())
}

/// First pass: drops blank lines directly above bold bullets and collapses
/// every other run of blank lines to a single empty line.
pub fn collapse_blank_lines(input: &str) -> String {
    let lines: Vec<&str> = input.split('\n').collect();
    let mut output: Vec<&str> = Vec::with_capacity(lines.len());
    let mut previous_blank = false;

    for (index, line) in lines.iter().enumerate() {
        if is_blank(line) {
            let next_is_bold_bullet = lines
                .get(index + 1)
                .is_some_and(|next| is_bold_bullet(next));
            if next_is_bold_bullet {
                continue;
            }
            if !previous_blank {
                output.push("");
                previous_blank = true;
            }
            continue;
        }

        // Headers and text alike end a blank run.
        previous_blank = false;
        output.push(line);
    }

    output.join("\n")
}

/// Second pass: rewrites `1. **Title**:` as `**1. Title**` plus a soft break
/// and drops the blank lines that directly follow a rewritten title.
pub fn compact_headers(input: &str) -> String {
    let mut output: Vec<String> = Vec::new();
    let mut after_title = false;

    for line in input.split('\n') {
        if let Some((ordinal, title)) = ordinal_title(line.trim()) {
            output.push(format!("**{ordinal}. {title}**{SOFT_BREAK}"));
            after_title = true;
            continue;
        }

        if after_title && is_blank(line) {
            continue;
        }

        after_title = false;
        output.push(line.to_string());
    }

    output.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_before_bold_bullet_is_dropped() {
        let input = "Summary of prices\n\n- **Average**: $7\n\n* **Median**: $6";
        assert_eq!(
            collapse_blank_lines(input),
            "Summary of prices\n- **Average**: $7\n* **Median**: $6"
        );
    }

    #[test]
    fn blank_runs_collapse_to_one() {
        let input = "first\n\n\n\n\nsecond\n   \n\t\nthird";
        assert_eq!(collapse_blank_lines(input), "first\n\nsecond\n\nthird");
    }

    #[test]
    fn nested_list_indentation_is_preserved() {
        let input = "- Boston\n    - Sub: $8.99\n\n\n  - Cookie: $2";
        assert_eq!(
            collapse_blank_lines(input),
            "- Boston\n    - Sub: $8.99\n\n  - Cookie: $2"
        );
    }

    #[test]
    fn headers_pass_through_and_reset_blank_state() {
        let input = "# Title\n\n\n## Sub\n\nbody";
        assert_eq!(collapse_blank_lines(input), "# Title\n\n## Sub\n\nbody");
    }

    #[test]
    fn collapse_never_leaves_three_empty_lines() {
        let inputs = [
            "\n\n\n\n",
            "a\n\n\n\n\n\nb\n\n\n",
            "\n \n\t\n- **x**\n\n\n\ny",
            "# h\n\n\n\n\n# h2\n\n\n",
        ];
        for input in inputs {
            let output = collapse_blank_lines(input);
            assert!(
                !output.contains("\n\n\n"),
                "three consecutive line breaks in {output:?}"
            );
        }
    }

    #[test]
    fn numbered_bold_titles_become_soft_break_lines() {
        let input = "1. **Price Comparison**:\n\nBoston is cheapest.\n2. **Trends**\nStable.";
        assert_eq!(
            compact_headers(input),
            "**1. Price Comparison**  \nBoston is cheapest.\n**2. Trends**  \nStable."
        );
    }

    #[test]
    fn titles_with_trailing_text_are_left_alone() {
        let input = "1. **Chips** are $1.50 everywhere";
        assert_eq!(compact_headers(input), input);
    }

    #[test]
    fn existing_soft_breaks_keep_following_blank_line() {
        let input = "line with break  \n\nnext paragraph";
        assert_eq!(compact_headers(input), input);
    }

    #[test]
    fn compact_headers_is_idempotent() {
        let input = "Intro\n\n1. **Turkey Sub**:\n\n$8.99\n\n2. **Cookie**:\n\n\n$2\n\n- **Note**";
        let once = compact_headers(input);
        assert_eq!(compact_headers(&once), once);
    }
}
