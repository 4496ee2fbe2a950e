//! Slug generation for pathway names
//!
//! Mirrors the web framework's `slugify`: decompose accented letters (NFKD),
//! keep ASCII word characters, whitespace and hyphens, lowercase, and
//! collapse separator runs into a single hyphen. `AddPatientPathway`
//! becomes `addpatientpathway`.

use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use std::sync::OnceLock;

fn disallowed() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s-]").expect("static regex"))
}

fn separators() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-\s]+").expect("static regex"))
}

/// Convert a pathway name into its URL-safe slug
pub fn slugify(value: &str) -> String {
    // Accents split off as combining marks and are dropped with the rest of non-ASCII
    let ascii: String = value.nfkd().filter(char::is_ascii).collect();
    let cleaned = disallowed().replace_all(&ascii, "");
    let lowered = cleaned.trim().to_lowercase();
    separators().replace_all(&lowered, "-").into_owned()
}

/// Whether a string is already in slug form
pub fn is_slug(value: &str) -> bool {
    !value.is_empty() && slugify(value) == value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_type_names() {
        assert_eq!(slugify("AddPatientPathway"), "addpatientpathway");
        assert_eq!(slugify("UnrolledPathway"), "unrolledpathway");
        assert_eq!(slugify("Tagging_Pathway"), "tagging_pathway");
    }

    #[test]
    fn test_slugify_separators() {
        assert_eq!(slugify("  Add  Patient -- Pathway "), "add-patient-pathway");
        assert_eq!(slugify("Referral: Oncology!"), "referral-oncology");
    }

    #[test]
    fn test_slugify_folds_accents() {
        assert_eq!(slugify("Café Pathway"), "cafe-pathway");
        assert_eq!(slugify("Über Müller"), "uber-muller");
        assert_eq!(slugify("ﬁrst visit"), "first-visit");
    }

    #[test]
    fn test_slugify_drops_non_decomposable() {
        assert_eq!(slugify("心 Pathway"), "pathway");
    }

    #[test]
    fn test_slugify_is_stable() {
        let once = slugify("Some Pathway");
        assert_eq!(slugify(&once), once);
        assert!(is_slug(&once));
        assert!(!is_slug("Some Pathway"));
        assert!(!is_slug(""));
    }
}
