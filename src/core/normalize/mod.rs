//! Rewrites generated markdown into a denser layout before rendering.
//!
//! Models tend to answer with numbered sections whose title is bold
//! (`1. **Price**:`) followed by blank lines and detail text. Rendered
//! naively this wastes a lot of vertical space. Two rewrites are available:
//!
//! - [`NormalizationStrategy::Compact`] collapses blank lines and turns each
//!   numbered bold title into a bold line ending in a soft break.
//! - [`NormalizationStrategy::Flatten`] folds each numbered title and the text
//!   after it into a single `- **title**: detail` bullet.
//!
//! Both are pure `&str -> String` transforms.

pub mod compact;
pub mod flatten;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `1. **Title**` with an optional trailing colon.
pub(crate) static ORDINAL_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.\s+\*\*(.+?)\*\*:?$").expect("ordinal title pattern is valid")
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizationStrategy {
    #[default]
    Compact,
    Flatten,
}

impl NormalizationStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            NormalizationStrategy::Compact => "compact",
            NormalizationStrategy::Flatten => "flatten",
        }
    }
}

impl fmt::Display for NormalizationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NormalizationStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(NormalizationStrategy::Compact),
            "flatten" => Ok(NormalizationStrategy::Flatten),
            other => Err(format!(
                "unknown normalization strategy '{other}' (expected 'compact' or 'flatten')"
            )),
        }
    }
}

pub fn normalize(input: &str, strategy: NormalizationStrategy) -> String {
    match strategy {
        NormalizationStrategy::Compact => {
            compact::compact_headers(&compact::collapse_blank_lines(input))
        }
        NormalizationStrategy::Flatten => flatten::flatten(input),
    }
}

/// Captures `(ordinal, title)` from a numbered bold title line.
pub(crate) fn ordinal_title(line: &str) -> Option<(&str, &str)> {
    let captures = ORDINAL_TITLE.captures(line)?;
    let ordinal = captures.get(1)?.as_str();
    let title = captures.get(2)?.as_str();
    Some((ordinal, title))
}

pub(crate) fn is_header(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "## Prices\n\n1. **Turkey Sub**:\n\n$8.99 in Boston\n\n\n\n2. **Cookie**\nAbout $2";

    #[test]
    fn compact_pipeline_runs_both_passes() {
        assert_eq!(
            normalize(SAMPLE, NormalizationStrategy::Compact),
            "## Prices\n\n**1. Turkey Sub**  \n$8.99 in Boston\n\n**2. Cookie**  \nAbout $2"
        );
    }

    #[test]
    fn flatten_pipeline_folds_titles_into_bullets() {
        assert_eq!(
            normalize(SAMPLE, NormalizationStrategy::Flatten),
            "## Prices\n\n- **Turkey Sub**: $8.99 in Boston\n- **Cookie**: About $2"
        );
    }

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!(
            "Flatten".parse::<NormalizationStrategy>(),
            Ok(NormalizationStrategy::Flatten)
        );
        assert!("fancy".parse::<NormalizationStrategy>().is_err());
    }

    #[test]
    fn ordinal_title_requires_bold_title() {
        assert_eq!(ordinal_title("3. **Chips**:"), Some(("3", "Chips")));
        assert_eq!(ordinal_title("12.  **Fountain Drink**"), Some(("12", "Fountain Drink")));
        assert_eq!(ordinal_title("3. Chips"), None);
        assert_eq!(ordinal_title("3. **Chips** are cheap"), None);
    }
}
