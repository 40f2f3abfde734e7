//! Slug derivation for sport and event names.
//!
//! Slugs are URL-safe, lowercase and hyphenated, and are unique per table
//! (enforced by the schema). Derivation is deterministic: two names that
//! differ only in case or punctuation produce the same slug.

use crate::store::CatalogError;

/// Derive a slug from a display name.
///
/// Lowercases the input, collapses every run of non-alphanumeric characters
/// into a single hyphen and strips leading/trailing hyphens. Empty input is
/// rejected with [`CatalogError::Validation`].
pub fn to_slug(name: &str) -> Result<String, CatalogError> {
    if name.is_empty() {
        return Err(CatalogError::Validation(
            "slug source name must not be empty".into(),
        ));
    }

    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_lowercasing() {
        assert_eq!(to_slug("Tennis").unwrap(), "tennis");
        assert_eq!(to_slug("FOOTBALL").unwrap(), "football");
    }

    #[test]
    fn punctuation_runs_collapse_to_one_hyphen() {
        assert_eq!(
            to_slug("Hello World! How are you?").unwrap(),
            "hello-world-how-are-you"
        );
        assert_eq!(to_slug("a  --  b").unwrap(), "a-b");
    }

    #[test]
    fn leading_and_trailing_hyphens_stripped() {
        assert_eq!(to_slug("  Premier League  ").unwrap(), "premier-league");
        assert_eq!(to_slug("***star***").unwrap(), "star");
    }

    #[test]
    fn deterministic_across_case_and_punctuation() {
        let variants = ["Grand Slam", "grand-slam", "GRAND...SLAM", "grand slam!"];
        for pair in variants.windows(2) {
            assert_eq!(to_slug(pair[0]).unwrap(), to_slug(pair[1]).unwrap());
        }
    }

    #[test]
    fn empty_input_is_a_validation_error() {
        let err = to_slug("").unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn digits_survive() {
        assert_eq!(to_slug("Formula 1").unwrap(), "formula-1");
    }
}
