//! Markup token protection for script lines.
//!
//! Bracketed tokens such as `[r]` or `[ruby text="..."]` are pulled out of a
//! line before translation and put back afterwards. The translator only ever
//! sees the placeholder ` @ ` where a token used to be.

use crate::error::CodecError;
use regex::Regex;
use std::sync::LazyLock;

/// Non-greedy match of a single bracketed token.
static TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("Invalid TOKEN_REGEX"));

/// Character that stands in for a token in cleaned text.
pub const PLACEHOLDER_CHAR: char = '@';

/// Replacement inserted for every token occurrence.
pub const PLACEHOLDER: &str = " @ ";

/// A line with its tokens removed, ready for translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Trimmed text with each token replaced by [`PLACEHOLDER`].
    pub cleaned: String,
    /// Tokens in the order they appeared.
    pub tokens: Vec<String>,
}

/// Extracts bracketed tokens from `line`.
pub fn extract(line: &str) -> Extracted {
    let tokens = TOKEN_REGEX
        .find_iter(line)
        .map(|m| m.as_str().to_string())
        .collect();
    let cleaned = TOKEN_REGEX
        .replace_all(line, PLACEHOLDER)
        .trim()
        .to_string();

    Extracted { cleaned, tokens }
}

/// Returns true when `text` holds nothing but placeholders and whitespace.
pub fn is_placeholder_only(text: &str) -> bool {
    text.chars()
        .all(|c| c == PLACEHOLDER_CHAR || c.is_whitespace())
}

/// Rebuilds a line from translated text and the original tokens.
///
/// The text is split on [`PLACEHOLDER_CHAR`]; token `i` goes after part `i`.
/// Each placeholder contributed one space on either side, so at most one
/// space is removed next to every split point. The line ends are trimmed.
///
/// This relies on the backend keeping every `@` in place. If the number of
/// placeholders no longer matches the token count the line is rejected
/// rather than rebuilt with tokens in the wrong spots.
pub fn reassemble(translated: &str, tokens: &[String]) -> Result<String, CodecError> {
    let parts: Vec<&str> = translated.trim().split(PLACEHOLDER_CHAR).collect();
    let found = parts.len() - 1;
    if found != tokens.len() {
        return Err(CodecError::PlaceholderMismatch {
            expected: tokens.len(),
            found,
        });
    }

    let last = parts.len() - 1;
    let token_len: usize = tokens.iter().map(String::len).sum();
    let mut line = String::with_capacity(translated.len() + token_len);
    for (i, part) in parts.iter().enumerate() {
        let mut part = *part;
        if i > 0 {
            part = part.strip_prefix(' ').unwrap_or(part);
        }
        if i < last {
            part = part.strip_suffix(' ').unwrap_or(part);
        }
        line.push_str(part);
        if let Some(token) = tokens.get(i) {
            line.push_str(token);
        }
    }

    Ok(line)
}

/// Decides which lines are sent through the codec at all.
#[derive(Debug, Clone)]
pub struct LineFilter {
    control_prefixes: Vec<String>,
}

impl LineFilter {
    /// Creates a filter skipping lines that start with any of `prefixes`.
    pub fn new(prefixes: &[String]) -> Self {
        Self {
            control_prefixes: prefixes
                .iter()
                .filter(|p| !p.is_empty())
                .cloned()
                .collect(),
        }
    }

    /// True for non-blank lines that are not comments, labels or commands.
    pub fn is_translatable(&self, line: &str) -> bool {
        let trimmed = line.trim();
        !trimmed.is_empty()
            && !self
                .control_prefixes
                .iter()
                .any(|p| trimmed.starts_with(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_no_tokens() {
        let extracted = extract("  plain text  ");
        assert_eq!(extracted.cleaned, "plain text");
        assert!(extracted.tokens.is_empty());
    }

    #[test]
    fn test_extract_is_non_greedy() {
        let extracted = extract("a[r]b[l][p]");
        assert_eq!(extracted.tokens, tokens(&["[r]", "[l]", "[p]"]));
        assert_eq!(extracted.cleaned, "a @ b @  @");
    }

    #[test]
    fn test_senpai_scenario() {
        let extracted = extract("„Hello [senpai]!“");
        assert_eq!(extracted.cleaned, "„Hello  @ !“");
        assert_eq!(extracted.tokens, tokens(&["[senpai]"]));

        let translated = extracted.cleaned.to_uppercase();
        assert_eq!(translated, "„HELLO  @ !“");
        assert_eq!(
            reassemble(&translated, &extracted.tokens).unwrap(),
            "„HELLO [senpai]!“"
        );
    }

    #[test]
    fn test_identity_round_trip() {
        for line in [
            "[a]text[b]",
            "Saber said[r] \"Master.\"[p]",
            "[ruby text=\"sen\"]先[ruby text=\"pai\"]輩",
            "[a] [b]",
        ] {
            let extracted = extract(line);
            assert_eq!(reassemble(&extracted.cleaned, &extracted.tokens).unwrap(), line);
        }
    }

    #[test]
    fn test_tokens_survive_any_translation() {
        let extracted = extract("one[x]two[y]three[z]");
        let translated = "UNO @ DOS@TRES   @";
        let line = reassemble(translated, &extracted.tokens).unwrap();
        assert_eq!(line, "UNO[x]DOS[y]TRES  [z]");

        let positions: Vec<usize> = extracted
            .tokens
            .iter()
            .map(|t| line.find(t.as_str()).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        for token in &extracted.tokens {
            assert_eq!(line.matches(token.as_str()).count(), 1);
        }
    }

    #[test]
    fn test_reassemble_without_tokens() {
        assert_eq!(reassemble("  Hola mundo ", &[]).unwrap(), "Hola mundo");
    }

    #[test]
    fn test_reassemble_detects_dropped_placeholder() {
        let err = reassemble("HELLO !", &tokens(&["[senpai]"])).unwrap_err();
        assert_eq!(
            err,
            CodecError::PlaceholderMismatch {
                expected: 1,
                found: 0
            }
        );
    }

    #[test]
    fn test_reassemble_detects_extra_placeholder() {
        let err = reassemble("mail me @ home @ now", &tokens(&["[r]"])).unwrap_err();
        assert_eq!(
            err,
            CodecError::PlaceholderMismatch {
                expected: 1,
                found: 2
            }
        );
    }

    #[test]
    fn test_placeholder_only() {
        assert!(is_placeholder_only("@"));
        assert!(is_placeholder_only("@  @"));
        assert!(is_placeholder_only(""));
        assert!(!is_placeholder_only("@ a"));
    }

    #[test]
    fn test_line_filter() {
        let filter = LineFilter::new(&tokens(&["@", ";", "*", "#"]));
        assert!(filter.is_translatable("Hello[r]"));
        assert!(filter.is_translatable("  indented dialogue"));
        assert!(!filter.is_translatable(""));
        assert!(!filter.is_translatable("   \r\n"));
        assert!(!filter.is_translatable("@bg storage=black"));
        assert!(!filter.is_translatable("  ; comment"));
        assert!(!filter.is_translatable("*label|"));
        assert!(!filter.is_translatable("#define"));
    }
}
