//! Rich text runs.

use serde::Deserialize;

/// One run of rich text. Only the plain text survives rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RichText {
    /// Text content without formatting.
    #[serde(default)]
    pub plain_text: String,
    /// Link target, if the run is a link or mention.
    #[serde(default)]
    pub href: Option<String>,
}

/// Concatenate the plain text of every run.
#[must_use]
pub fn plain_text(runs: &[RichText]) -> String {
    runs.iter().map(|run| run.plain_text.as_str()).collect()
}

/// Concatenated title text, or `placeholder` if it is blank.
#[must_use]
pub fn title_or(runs: &[RichText], placeholder: &str) -> String {
    let title = plain_text(runs);
    if title.trim().is_empty() {
        placeholder.to_owned()
    } else {
        title
    }
}
