//! Inline hashtag parsing.
//!
//! Task text may carry a `#hashtag`; the first one becomes the task's tag
//! and every hashtag token is stripped from the stored text.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum length of a tag, in characters.
pub const MAX_TAG_LENGTH: usize = 50;

/// A `#` at the start of the text or after whitespace, followed by 1-50 tag characters.
static HASHTAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|\s)#([A-Za-z0-9_-]{1,50})\b").expect("Invalid hashtag regex pattern")
});

static WHITESPACE_RUN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("Invalid whitespace regex pattern"));

/// A lowercase label attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    /// Creates a tag, lowercasing the given name.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().to_lowercase())
    }

    /// Returns the tag name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Result of [`parse_tag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedText {
    /// Text with every hashtag token removed and whitespace collapsed.
    pub text: String,
    /// The first hashtag found, lowercased and without `#`.
    pub tag: Option<Tag>,
}

/// Extracts the first inline hashtag from `raw` and strips all hashtag tokens.
///
/// Each removed token takes exactly one preceding whitespace character with
/// it. Remaining runs of two or more whitespace characters collapse to a
/// single space and the result is trimmed.
///
/// # Examples
///
/// ```
/// use task_journal_api::domain::parse_tag;
///
/// let parsed = parse_tag("Buy milk #shopping");
/// assert_eq!(parsed.text, "Buy milk");
/// assert_eq!(parsed.tag.unwrap().as_str(), "shopping");
/// ```
#[must_use]
pub fn parse_tag(raw: &str) -> ParsedText {
    let tag = HASHTAG_PATTERN
        .captures(raw)
        .and_then(|captures| captures.get(2))
        .map(|token| Tag::new(token.as_str()));

    let stripped = HASHTAG_PATTERN.replace_all(raw, "");
    let collapsed = WHITESPACE_RUN_PATTERN.replace_all(&stripped, " ");

    ParsedText {
        text: collapsed.trim().to_string(),
        tag,
    }
}

/// Error returned when an explicit tag exceeds [`MAX_TAG_LENGTH`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Tag must not exceed {MAX_TAG_LENGTH} characters")]
pub struct TagTooLong;

/// Normalizes an explicitly supplied tag.
///
/// Trims, strips one leading `#`, and lowercases. A tag that is empty after
/// stripping is treated as absent.
///
/// # Errors
///
/// Returns [`TagTooLong`] if the stripped tag is longer than
/// [`MAX_TAG_LENGTH`] characters.
pub fn normalize_tag(raw: &str) -> Result<Option<Tag>, TagTooLong> {
    let trimmed = raw.trim();
    let stripped = trimmed.strip_prefix('#').unwrap_or(trimmed);

    if stripped.is_empty() {
        return Ok(None);
    }
    if stripped.chars().count() > MAX_TAG_LENGTH {
        return Err(TagTooLong);
    }

    Ok(Some(Tag::new(stripped)))
}
