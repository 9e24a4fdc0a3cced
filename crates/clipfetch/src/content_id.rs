use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::error::FetchError;

/// Matches a content id anywhere in the input: `s_` followed by at least
/// eight identifier characters.
pub static CONTENT_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"s_[A-Za-z0-9_-]{8,}").unwrap());

/// Where shared clips are published.
pub const DEFAULT_PAGE_BASE: &str = "https://sora.chatgpt.com/p/";

/// Canonical identifier of a shared clip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentId(String);

impl ContentId {
    /// Pull the first content id out of a URL or a bare code.
    pub fn extract(input: &str) -> Option<Self> {
        CONTENT_ID_REGEX
            .find(input)
            .map(|m| Self(m.as_str().to_owned()))
    }

    /// Like [`ContentId::extract`], but reports a missing id as invalid input.
    pub fn parse(input: &str) -> Result<Self, FetchError> {
        Self::extract(input).ok_or_else(|| FetchError::invalid_input(input))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Public page of the clip under `page_base`; used for Referer headers.
    pub fn canonical_page(&self, page_base: &str) -> String {
        format!("{page_base}{}", self.0)
    }

    /// Name of the file handed back to the caller.
    pub fn filename(&self) -> String {
        format!("{}_HD.mp4", self.0)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        "https://sora.chatgpt.com/p/s_68e3a1b2c4d5e6f7a8b9c0d1",
        "s_68e3a1b2c4d5e6f7a8b9c0d1"
    )]
    #[case("s_abcdefgh", "s_abcdefgh")]
    #[case("look at s_AB-cd_12ef please", "s_AB-cd_12ef")]
    #[case(
        "https://sora.chatgpt.com/p/s_12345678?utm=share",
        "s_12345678"
    )]
    #[case("s_11111111 and s_22222222", "s_11111111")]
    fn test_extract_finds_id(#[case] input: &str, #[case] expected: &str) {
        let id = ContentId::extract(input).unwrap();
        assert_eq!(id.as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("https://sora.chatgpt.com/explore")]
    #[case("s_1234567")]
    #[case("S_12345678")]
    #[case("x_12345678")]
    fn test_extract_rejects(#[case] input: &str) {
        assert!(ContentId::extract(input).is_none());
    }

    #[test]
    fn test_parse_reports_invalid_input() {
        let err = ContentId::parse("nothing here").unwrap_err();
        assert!(matches!(err, FetchError::InvalidInput { .. }));
    }

    #[test]
    fn test_filename_and_page() {
        let id = ContentId::parse("s_abcdefgh").unwrap();
        assert_eq!(id.filename(), "s_abcdefgh_HD.mp4");
        assert_eq!(
            id.canonical_page(DEFAULT_PAGE_BASE),
            "https://sora.chatgpt.com/p/s_abcdefgh"
        );
        assert_eq!(
            id.canonical_page("http://127.0.0.1:1234/p/"),
            "http://127.0.0.1:1234/p/s_abcdefgh"
        );
    }
}
