//! Dollar-delimited math detection for text leaves.
//!
//! The check is a plain prefix/suffix test on the whole leaf; it does not
//! look for math embedded inside longer text.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathSpan<'a> {
    /// `$…$`
    Inline(&'a str),
    /// `$$…$$`
    Block(&'a str),
}

impl<'a> MathSpan<'a> {
    pub fn expression(self) -> &'a str {
        match self {
            MathSpan::Inline(expr) | MathSpan::Block(expr) => expr,
        }
    }
}

/// Classifies a text leaf whose entire content is wrapped in `$$` (block) or
/// `$` (inline). Double delimiters are tested first. Empty expressions are
/// not math.
pub fn detect_math(text: &str) -> Option<MathSpan<'_>> {
    if let Some(inner) = text
        .strip_prefix("$$")
        .and_then(|rest| rest.strip_suffix("$$"))
    {
        if !inner.trim().is_empty() {
            return Some(MathSpan::Block(inner));
        }
    }

    let inner = text.strip_prefix('$')?.strip_suffix('$')?;
    if inner.trim().is_empty() {
        return None;
    }
    Some(MathSpan::Inline(inner))
}
