//! Slug derivation and parsing
//!
//! A slug is the slugified title followed by `-` and the article id in
//! lowercase hex, e.g. `how-to-train-your-dragon-1f3a9c`. The id is always
//! recoverable from the text after the last `-`.

use ::slug::slugify;

use crate::error::{ArticleError, ArticleResult};
use crate::models::ArticleId;

/// Build the slug for an article
pub fn make_slug(title: &str, id: ArticleId) -> String {
    format!("{}-{}", slugify(title), id.to_hex())
}

/// Recover the article id from a slug
///
/// Fails with [`ArticleError::InvalidSlug`] when there is no `-` or the
/// suffix is not a positive base-16 integer.
pub fn parse_slug(slug: &str) -> ArticleResult<ArticleId> {
    let invalid = || ArticleError::InvalidSlug(slug.to_string());

    let (_, suffix) = slug.rsplit_once('-').ok_or_else(invalid)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    i64::from_str_radix(suffix, 16)
        .ok()
        .and_then(ArticleId::new)
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_slug() {
        let id = ArticleId::new(0x1f3a9c).unwrap();
        assert_eq!(
            make_slug("How to train your dragon", id),
            "how-to-train-your-dragon-1f3a9c"
        );
    }

    #[test]
    fn test_make_slug_strips_punctuation() {
        let id = ArticleId::new(10).unwrap();
        assert_eq!(make_slug("  Hello, World!  ", id), "hello-world-a");
    }

    #[test]
    fn test_parse_slug_round_trip() {
        for raw in [1, 0xabc, 123_456_789, i64::MAX - 1] {
            let id = ArticleId::new(raw).unwrap();
            let slug = make_slug("Some title - with dashes", id);
            assert_eq!(parse_slug(&slug).unwrap(), id);
        }
    }

    #[test]
    fn test_parse_slug_without_dash() {
        let err = parse_slug("nodash").unwrap_err();
        assert!(matches!(err, ArticleError::InvalidSlug(ref s) if s == "nodash"));
        assert!(err.is_input());
    }

    #[test]
    fn test_parse_slug_bad_suffix() {
        assert!(parse_slug("title-xyz").is_err());
        assert!(parse_slug("title-").is_err());
        assert!(parse_slug("title-+ff").is_err());
        assert!(parse_slug("title-0").is_err());
        // Overflows i64
        assert!(parse_slug("title-ffffffffffffffffff").is_err());
    }

    #[test]
    fn test_parse_slug_accepts_uppercase_hex() {
        assert_eq!(parse_slug("title-FF").unwrap().get(), 255);
    }
}
