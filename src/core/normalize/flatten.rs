//! Flatten pipeline: numbered bold titles and their detail text become
//! single-line bullets.

use std::sync::LazyLock;

use regex::Regex;

use super::{is_header, ordinal_title};

static EXCESS_BREAKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("line break pattern is valid"));

#[derive(Debug, Default)]
struct PendingTitle {
    title: String,
    detail: String,
}

impl PendingTitle {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            detail: String::new(),
        }
    }

    fn append(&mut self, text: &str) {
        if !self.detail.is_empty() {
            self.detail.push(' ');
        }
        self.detail.push_str(text);
    }

    fn into_bullet(self) -> String {
        format!("- **{}**: {}", self.title, self.detail)
            .trim()
            .to_string()
    }
}

fn is_bullet(line: &str) -> bool {
    let mut chars = line.chars();
    matches!(chars.next(), Some('-' | '*')) && chars.next().is_none_or(char::is_whitespace)
}

fn is_dangling_bullet(line: &str) -> bool {
    matches!(line, "-" | "*")
}

pub fn flatten(input: &str) -> String {
    let lines: Vec<&str> = input.split('\n').collect();
    let mut output: Vec<String> = Vec::with_capacity(lines.len());
    let mut pending: Option<PendingTitle> = None;

    let flush = |pending: &mut Option<PendingTitle>, output: &mut Vec<String>| {
        if let Some(entry) = pending.take() {
            output.push(entry.into_bullet());
        }
    };

    let mut index = 0;
    while index < lines.len() {
        let line = lines[index];
        let trimmed = line.trim();
        index += 1;

        if is_header(trimmed) {
            flush(&mut pending, &mut output);
            output.push(line.to_string());
            continue;
        }

        if let Some((_, title)) = ordinal_title(trimmed) {
            flush(&mut pending, &mut output);
            pending = Some(PendingTitle::new(title));
            continue;
        }

        if is_bullet(trimmed) {
            flush(&mut pending, &mut output);
            if is_dangling_bullet(trimmed) {
                let next = lines
                    .get(index)
                    .map(|next| next.trim())
                    .filter(|next| !next.is_empty() && !is_header(next));
                if let Some(next) = next {
                    output.push(format!("- {next}"));
                    index += 1;
                    continue;
                }
            }
            output.push(line.to_string());
            continue;
        }

        if trimmed.is_empty() {
            if pending.is_none() {
                output.push(String::new());
            }
            continue;
        }

        match pending.as_mut() {
            Some(entry) => entry.append(trimmed),
            None => output.push(line.to_string()),
        }
    }
    flush(&mut pending, &mut output);

    EXCESS_BREAKS
        .replace_all(&output.join("\n"), "\n\n")
        .into_owned()
}
